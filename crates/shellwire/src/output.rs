use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use shellwire_envelope::{CategoryValue, OutputFormat, ResultEnvelope};

/// How the CLI prints results on stdout.
#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputMode {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct EnvelopeOutput<'a> {
    command: &'a str,
    format: OutputFormat,
    has_errors: bool,
    result: &'a ResultEnvelope,
    timestamp: String,
}

pub fn print_envelope(command: &str, format: OutputFormat, envelope: &ResultEnvelope, mode: OutputMode) {
    match mode {
        OutputMode::Json => {
            let out = EnvelopeOutput {
                command,
                format,
                has_errors: envelope.has_errors(),
                result: envelope,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputMode::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CATEGORY", "VALUE"]);
            for (category, value) in envelope.non_empty() {
                table.add_row(vec![category.name().to_string(), render(value)]);
            }
            println!("> {command}");
            println!("{table}");
        }
        OutputMode::Pretty => {
            println!("command={command} format={format}");
            for (category, value) in envelope.non_empty() {
                println!("  {category}: {}", render(value));
            }
        }
        OutputMode::Raw => {
            let mut text = render(&envelope.success);
            if !text.ends_with('\n') {
                text.push('\n');
            }
            print_raw(text.as_bytes());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Text for one category: raw text as-is, decoded values as compact JSON.
pub fn render(value: &CategoryValue) -> String {
    match value {
        CategoryValue::Raw(text) => text.clone(),
        CategoryValue::Decoded(value) => value.to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
