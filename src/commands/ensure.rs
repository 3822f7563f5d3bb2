//! Reconcile packages against a desired state.

use anyhow::Result;
use colored::Colorize;
use condakit::{DesiredState, InvocationResult, PackageState};
use serde_json::{Value, json};
use std::path::Path;
use std::process::ExitCode;

use crate::Context;
use crate::cli::{EnsureArgs, OutputFormat};
use crate::config::Config;
use crate::{paths, ui};

pub fn run(ctx: &Context, args: EnsureArgs) -> Result<ExitCode> {
    let desired = match paths::config_file().and_then(|file| desired_state(&file, &args)) {
        Ok(desired) => desired,
        Err(err) => {
            match args.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&setup_failure_json(&err))?);
                }
                OutputFormat::Text => ui::error(&format!("{err:#}")),
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    log::info!(
        "Ensuring {} {} in {}",
        desired.packages.join(" "),
        desired.state,
        desired.settings.environment
    );

    let outcome = condakit::reconcile(&desired);
    match args.format {
        OutputFormat::Json => render_json(&outcome)?,
        OutputFormat::Text => render_text(ctx, &desired, &outcome),
    }

    Ok(if outcome.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Combine the command line with the config file at `config_file`
fn desired_state(config_file: &Path, args: &EnsureArgs) -> Result<DesiredState> {
    let config = Config::load_from(config_file)?;
    let settings = config.settings(
        args.env.environment.as_deref(),
        args.env.executable.as_deref(),
        &args.channels,
        args.check,
    );
    Ok(DesiredState::new(args.packages.iter().cloned(), args.state.into()).with_settings(settings))
}

// ============================================================================
// JSON output
// ============================================================================

fn render_json(outcome: &condakit::Result<InvocationResult>) -> Result<()> {
    let doc = match outcome {
        Ok(result) => success_json(result)?,
        Err(err) => failure_json(err),
    };
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

/// The result document: changed, cmd, rc, stdout_json, stderr
fn success_json(result: &InvocationResult) -> Result<Value> {
    Ok(serde_json::to_value(result)?)
}

/// Failure document for errors raised before conda is involved
fn setup_failure_json(err: &anyhow::Error) -> Value {
    json!({
        "failed": true,
        "msg": format!("{err:#}"),
    })
}

/// The failure document, with whatever context the error carries
fn failure_json(err: &condakit::Error) -> Value {
    let mut doc = json!({
        "failed": true,
        "msg": err.to_string(),
    });
    if let Some(message) = err.tool_message() {
        doc["tool_message"] = json!(message);
    }
    if let Some(cmd) = err.cmd() {
        doc["cmd"] = json!(cmd);
    }
    if let Some(rc) = err.rc() {
        doc["rc"] = json!(rc);
    }
    if let Some((stdout, stderr)) = err.streams() {
        doc["stdout"] = json!(stdout);
        doc["stderr"] = json!(stderr);
    }
    doc
}

// ============================================================================
// Text output
// ============================================================================

fn render_text(
    ctx: &Context,
    desired: &DesiredState,
    outcome: &condakit::Result<InvocationResult>,
) {
    match outcome {
        Ok(result) => print_result(ctx, desired, result),
        Err(err) => print_error(err),
    }
}

fn print_result(ctx: &Context, desired: &DesiredState, result: &InvocationResult) {
    let what = match desired.state {
        PackageState::Present => "installed",
        PackageState::Latest => "up to date",
        PackageState::Absent => "removed",
    };
    let env = &desired.settings.environment;

    if result.changed {
        let verb = if desired.settings.dry_run {
            "would change"
        } else {
            "changed"
        };
        ui::success(&format!("{} ({})", format!("{env}: {verb}").bold(), what));
    } else {
        ui::info(&format!("{env}: nothing to do, packages already {what}"));
    }

    if ctx.quiet {
        return;
    }
    if result.cmd.is_empty() {
        ui::dim("No conda command was run");
    } else {
        ui::kv("command", &result.command_line());
        ui::kv("exit code", &result.rc.to_string());
    }
    if ctx.verbose > 0 {
        if let Ok(pretty) = serde_json::to_string_pretty(&result.stdout_json) {
            println!("{}", ui::indent(&pretty, 4).dimmed());
        }
    }
    if !result.stderr.trim().is_empty() {
        ui::warn("conda wrote to stderr:");
        println!("{}", ui::indent(result.stderr.trim(), 4).dimmed());
    }
}

fn print_error(err: &condakit::Error) {
    ui::error(&err.to_string());
    if let Some(message) = err.tool_message() {
        ui::error(&message);
    } else if let Some((stdout, stderr)) = err.streams() {
        for stream in [stdout, stderr] {
            if !stream.trim().is_empty() {
                eprintln!("{}", ui::indent(stream.trim(), 4).dimmed());
            }
        }
    }
    let category = err.category();
    eprintln!("  {} {}", category.description().yellow(), category.advice().dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_success_json_shape() {
        let doc = success_json(&InvocationResult::unchanged()).unwrap();
        assert_eq!(
            doc,
            json!({
                "changed": false,
                "cmd": [],
                "rc": 0,
                "stdout_json": {},
                "stderr": "",
            })
        );
    }

    #[test]
    fn test_failure_json_command_failed() {
        let err = condakit::Error::CommandFailed {
            cmd: vec!["conda".into(), "install".into(), "nope".into()],
            rc: 1,
            stdout: r#"{"exception_name": "PackagesNotFoundError", "message": "nope"}"#.into(),
            stderr: "boom".into(),
        };
        let doc = failure_json(&err);
        assert_eq!(doc["failed"], true);
        assert_eq!(doc["rc"], 1);
        assert_eq!(doc["cmd"], json!(["conda", "install", "nope"]));
        assert_eq!(doc["stderr"], "boom");
        assert_eq!(doc["tool_message"], "PackagesNotFoundError: nope");
    }

    fn ensure_args(argv: &[&str]) -> EnsureArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        let Command::Ensure(args) = cli.command else {
            panic!("expected ensure");
        };
        args
    }

    #[test]
    fn test_malformed_config_yields_failure_document() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "defaults = [").unwrap();
        let args = ensure_args(&["condactl", "ensure", "flask", "--executable", "/mypath/conda"]);

        let err = desired_state(&file, &args).unwrap_err();
        let doc = setup_failure_json(&err);
        assert_eq!(doc["failed"], true);
        let msg = doc["msg"].as_str().unwrap();
        assert!(msg.contains("config.toml"), "{msg}");
        assert!(msg.starts_with("Invalid config file"), "{msg}");
    }

    #[test]
    fn test_desired_state_merges_config() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("config.toml");
        std::fs::write(&file, "[defaults]\nenvironment = \"science\"\n").unwrap();
        let args = ensure_args(&[
            "condactl", "ensure", "flask=1.0", "--state", "latest", "--check",
        ]);

        let desired = desired_state(&file, &args).unwrap();
        assert_eq!(desired.packages, vec!["flask=1.0"]);
        assert_eq!(desired.state, PackageState::Latest);
        assert_eq!(desired.settings.environment, "science");
        assert!(desired.settings.dry_run);
    }

    #[test]
    fn test_failure_json_tool_not_found() {
        let err = condakit::Error::ToolNotFound {
            searched: "/usr/bin:/opt/conda/bin".into(),
        };
        let doc = failure_json(&err);
        assert_eq!(doc["failed"], true);
        assert!(doc.get("cmd").is_none());
        assert!(doc.get("rc").is_none());
    }
}
