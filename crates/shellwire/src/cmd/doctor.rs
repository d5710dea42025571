use std::path::Path;
use std::time::Duration;

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use shellwire_process::{EngineConfig, EngineProcess};

use crate::cmd::{parse_duration, runtime, DoctorArgs, EngineArgs};
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(args: DoctorArgs, engine: &EngineArgs, mode: OutputMode) -> CliResult<i32> {
    let exit_timeout = parse_duration(&args.timeout)?;
    let engine_config = engine.engine_config();

    let checks = vec![
        platform_check(),
        runtime()?.block_on(engine_check(&engine_config, exit_timeout)),
        scratch_dir_check(engine.scratch_dir.as_deref()),
        compiled_features_check(),
    ];

    let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
    let output = DoctorOutput {
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };
    print_doctor(&output, mode);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, mode: OutputMode) {
    match mode {
        OutputMode::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputMode::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHECK", "STATUS", "DETAIL"]);
            for c in &output.checks {
                table.add_row(vec![c.name, status_text(c.status), c.detail.as_str()]);
            }
            println!("{table}");
            println!("overall: {}", output.overall);
        }
        OutputMode::Pretty => {
            println!("shellwire doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<18} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputMode::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}

fn platform_check() -> CheckResult {
    CheckResult::new(
        "platform",
        CheckStatus::Info,
        format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
    )
}

/// Start the engine, note its pid, then terminate it.
async fn engine_check(config: &EngineConfig, exit_timeout: Duration) -> CheckResult {
    let executable = config.resolved_executable().display().to_string();
    let mut process = match EngineProcess::start(config) {
        Ok(process) => process,
        Err(err) => return CheckResult::new("engine_spawn", CheckStatus::Fail, err.to_string()),
    };

    let pid = process.pid();
    if let Err(err) = process.terminate() {
        return CheckResult::new(
            "engine_spawn",
            CheckStatus::Fail,
            format!("{executable} started (pid {pid}) but could not be terminated: {err}"),
        );
    }
    match tokio::time::timeout(exit_timeout, process.wait()).await {
        Ok(_) => CheckResult::new(
            "engine_spawn",
            CheckStatus::Pass,
            format!("{executable} started (pid {pid})"),
        ),
        Err(_) => CheckResult::new(
            "engine_spawn",
            CheckStatus::Fail,
            format!("{executable} (pid {pid}) did not exit after terminate"),
        ),
    }
}

fn scratch_dir_check(dir: Option<&Path>) -> CheckResult {
    let Some(dir) = dir else {
        return CheckResult::new("scratch_dir", CheckStatus::Skip, "not configured");
    };
    if !dir.exists() {
        return CheckResult::new(
            "scratch_dir",
            CheckStatus::Fail,
            format!("{} does not exist", dir.display()),
        );
    }
    if !dir.is_dir() {
        return CheckResult::new(
            "scratch_dir",
            CheckStatus::Fail,
            format!("{} is not a directory", dir.display()),
        );
    }
    CheckResult::new("scratch_dir", CheckStatus::Pass, dir.display().to_string())
}

fn compiled_features_check() -> CheckResult {
    let mut features = Vec::new();
    if cfg!(feature = "pipeline") {
        features.push("pipeline");
    }
    if cfg!(feature = "cli") {
        features.push("cli");
    }
    CheckResult::new("compiled_features", CheckStatus::Info, features.join(", "))
}
