use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use shellwire_envelope::OutputFormat;
use shellwire_frame::Sentinels;

/// Turns a caller's command into the text written to the engine's input.
///
/// Whatever is produced must make the engine print exactly one frame for the
/// command: the head sentinel, a `{"result": {...}}` payload, then the tail
/// sentinel. It must also keep the engine's echo of the command from
/// containing either sentinel literally, or the echo would be mistaken for a
/// frame.
pub trait CommandEncoder: Send + Sync {
    fn encode(
        &self,
        command: &str,
        sentinels: &Sentinels,
        format: OutputFormat,
        scratch_dir: Option<&Path>,
    ) -> String;
}

impl<F> CommandEncoder for F
where
    F: Fn(&str, &Sentinels, OutputFormat, Option<&Path>) -> String + Send + Sync,
{
    fn encode(
        &self,
        command: &str,
        sentinels: &Sentinels,
        format: OutputFormat,
        scratch_dir: Option<&Path>,
    ) -> String {
        self(command, sentinels, format, scratch_dir)
    }
}

/// Encoder for PowerShell hosts reading script from stdin (`-Command -`).
///
/// The command travels base64-encoded on a single line and is dot-sourced,
/// so variables it defines survive into later commands. Every stream is
/// merged and split back into categories by record type.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerShellEncoder {
    /// Depth passed to `ConvertTo-Json` for success output.
    pub json_depth: Option<u32>,
}

const DEFAULT_JSON_DEPTH: u32 = 4;

impl PowerShellEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn success_expr(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => format!(
                "(ConvertTo-Json -InputObject @($__sw_out) -Depth {} -Compress)",
                self.json_depth.unwrap_or(DEFAULT_JSON_DEPTH)
            ),
            OutputFormat::Csv => {
                "(($__sw_out | ConvertTo-Csv -NoTypeInformation) -join \"`n\")".to_string()
            }
            OutputFormat::Html => "(($__sw_out | ConvertTo-Html -Fragment) -join \"`n\")".to_string(),
            OutputFormat::Text => "(($__sw_out | Out-String).TrimEnd())".to_string(),
            OutputFormat::Raw => {
                "(($__sw_out | ForEach-Object { \"$_\" }) -join \"`n\")".to_string()
            }
        }
    }
}

impl CommandEncoder for PowerShellEncoder {
    fn encode(
        &self,
        command: &str,
        sentinels: &Sentinels,
        format: OutputFormat,
        scratch_dir: Option<&Path>,
    ) -> String {
        let encoded = BASE64_STANDARD.encode(command.as_bytes());

        let (enter, leave) = match scratch_dir {
            Some(dir) => (
                format!(
                    "Push-Location -LiteralPath {}; ",
                    quote(&dir.to_string_lossy())
                ),
                " finally { Pop-Location }",
            ),
            None => (String::new(), ""),
        };

        let statements = [
            format!(
                "$__sw_cmd = [Text.Encoding]::UTF8.GetString([Convert]::FromBase64String('{encoded}'))"
            ),
            "$__sw_all = [System.Collections.ArrayList]::new()".to_string(),
            format!(
                "{enter}try {{ . ([ScriptBlock]::Create($__sw_cmd)) *>&1 | ForEach-Object {{ [void]$__sw_all.Add($_) }} }} catch {{ [void]$__sw_all.Add($_) }}{leave}"
            ),
            "$__sw_out = @(); $__sw_err = @(); $__sw_warn = @(); $__sw_verb = @(); $__sw_dbg = @(); $__sw_info = @()".to_string(),
            concat!(
                "foreach ($__sw_r in $__sw_all) { ",
                "if ($__sw_r -is [System.Management.Automation.ErrorRecord]) { $__sw_err += $__sw_r.ToString() } ",
                "elseif ($__sw_r -is [System.Management.Automation.WarningRecord]) { $__sw_warn += $__sw_r.Message } ",
                "elseif ($__sw_r -is [System.Management.Automation.VerboseRecord]) { $__sw_verb += $__sw_r.Message } ",
                "elseif ($__sw_r -is [System.Management.Automation.DebugRecord]) { $__sw_dbg += $__sw_r.Message } ",
                "elseif ($__sw_r -is [System.Management.Automation.InformationRecord]) { $__sw_info += \"$($__sw_r.MessageData)\" } ",
                "else { $__sw_out += $__sw_r } }"
            )
            .to_string(),
            format!(
                concat!(
                    "$__sw_env = @{{ result = @{{ ",
                    "success = {success}; ",
                    "error = (ConvertTo-Json -InputObject @($__sw_err) -Compress); ",
                    "warning = (ConvertTo-Json -InputObject @($__sw_warn) -Compress); ",
                    "verbose = ($__sw_verb -join \"`n\"); ",
                    "debug = ($__sw_dbg -join \"`n\"); ",
                    "info = (ConvertTo-Json -InputObject @($__sw_info) -Compress); ",
                    "format = '{format}' }} }}"
                ),
                success = self.success_expr(format),
                format = format.name(),
            ),
            format!(
                "[Console]::Out.Write({} + (ConvertTo-Json -InputObject $__sw_env -Depth 3 -Compress) + {})",
                split_literal(sentinels.head()),
                split_literal(sentinels.tail())
            ),
            "[Console]::Out.Flush()".to_string(),
        ];

        let mut script = statements.join("; ");
        script.push('\n');
        script
    }
}

/// Single-quoted PowerShell string literal.
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// A sentinel spelled as two concatenated literals, so the script text never
/// contains it verbatim.
fn split_literal(text: &str) -> String {
    let mid = text
        .char_indices()
        .map(|(i, _)| i)
        .find(|&i| i >= text.len() / 2 && i > 0)
        .unwrap_or(text.len());
    if mid == text.len() {
        return quote(text);
    }
    let (first, second) = text.split_at(mid);
    format!("({} + {})", quote(first), quote(second))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn encode(command: &str, format: OutputFormat, scratch: Option<&Path>) -> String {
        PowerShellEncoder::new().encode(command, &Sentinels::default(), format, scratch)
    }

    #[test]
    fn script_is_one_line() {
        let script = encode("Get-Date\nGet-Location", OutputFormat::Json, None);
        assert!(script.ends_with('\n'));
        assert_eq!(script.matches('\n').count(), 1);
        assert!(!script.contains('\r'));
    }

    #[test]
    fn command_travels_base64_encoded() {
        let command = "Write-Output 'it''s <#SHELLWIRE:HEAD#>'";
        let script = encode(command, OutputFormat::Json, None);
        assert!(script.contains(&BASE64_STANDARD.encode(command)));
        assert!(!script.contains("Write-Output"));
    }

    #[test]
    fn sentinels_never_appear_verbatim() {
        let sentinels = Sentinels::default();
        let script = encode("Get-Date", OutputFormat::Json, None);
        assert!(!script.contains(sentinels.head()));
        assert!(!script.contains(sentinels.tail()));
        assert!(script.contains("('<#SHELLWI' + 'RE:HEAD#>')"));
        assert!(script.contains("('<#SHELLWI' + 'RE:TAIL#>')"));
    }

    #[test]
    fn success_serializer_follows_format() {
        let cases = [
            (OutputFormat::Json, "ConvertTo-Json -InputObject @($__sw_out) -Depth 4"),
            (OutputFormat::Csv, "ConvertTo-Csv -NoTypeInformation"),
            (OutputFormat::Html, "ConvertTo-Html -Fragment"),
            (OutputFormat::Text, "Out-String"),
            (OutputFormat::Raw, "ForEach-Object { \"$_\" }"),
        ];
        for (format, needle) in cases {
            let script = encode("Get-Process", format, None);
            assert!(script.contains(needle), "{format}: missing {needle}");
            assert!(script.contains(&format!("format = '{}'", format.name())));
        }
    }

    #[test]
    fn json_depth_is_configurable() {
        let encoder = PowerShellEncoder { json_depth: Some(8) };
        let script = encoder.encode("Get-Item .", &Sentinels::default(), OutputFormat::Json, None);
        assert!(script.contains("-Depth 8 -Compress"));
    }

    #[test]
    fn scratch_dir_is_entered_and_left() {
        let dir = PathBuf::from("/tmp/o'neil");
        let script = encode("Get-ChildItem", OutputFormat::Json, Some(&dir));
        assert!(script.contains("Push-Location -LiteralPath '/tmp/o''neil'; try {"));
        assert!(script.contains("finally { Pop-Location }"));

        let script = encode("Get-ChildItem", OutputFormat::Json, None);
        assert!(!script.contains("Push-Location"));
    }

    #[test]
    fn custom_sentinels_are_split() {
        let sentinels = Sentinels::new("@@BEGIN@@", "@@END@@").unwrap();
        let script = PowerShellEncoder::new().encode("1", &sentinels, OutputFormat::Raw, None);
        assert!(!script.contains("@@BEGIN@@"));
        assert!(script.contains("('@@BE' + 'GIN@@')"));
        assert!(script.contains("('@@E' + 'ND@@')"));
    }

    #[test]
    fn single_char_sentinel_is_quoted_whole() {
        assert_eq!(split_literal("#"), "'#'");
        assert_eq!(split_literal("ab"), "('a' + 'b')");
    }

    #[test]
    fn closures_are_encoders() {
        let echo = |command: &str, _: &Sentinels, _: OutputFormat, _: Option<&Path>| {
            format!("{command}\n")
        };
        assert_eq!(
            echo.encode("Get-Date", &Sentinels::default(), OutputFormat::Json, None),
            "Get-Date\n"
        );
    }
}
