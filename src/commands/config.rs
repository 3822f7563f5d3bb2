//! Configuration inspection.

use anyhow::Result;
use colored::Colorize;
use std::process::ExitCode;

use crate::Context;
use crate::cli::ConfigCommand;
use crate::config::Config;
use crate::paths;
use crate::ui;

pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<ExitCode> {
    match cmd {
        ConfigCommand::Show => show(ctx)?,
        ConfigCommand::Path => println!("{}", paths::config_file()?.display()),
    }
    Ok(ExitCode::SUCCESS)
}

fn show(ctx: &Context) -> Result<()> {
    let file = paths::config_file()?;
    let config = Config::load_from(&file)?;
    let settings = config.settings(None, None, &[], false);

    ui::header("Configuration");
    ui::kv("config dir", &paths::config_dir()?.display().to_string());
    let status = if file.exists() {
        "found".green()
    } else {
        "not found, using defaults".yellow()
    };
    ui::kv("config file", &format!("{} ({status})", file.display()));

    println!();
    ui::kv("environment", &settings.environment);
    let executable = settings.executable.as_ref().map_or_else(
        || {
            format!(
                "auto (PATH, then {})",
                condakit::discovery::FALLBACK_DIR
            )
        },
        |p| p.display().to_string(),
    );
    ui::kv("executable", &executable);
    let channels = if settings.channels.is_empty() {
        "(none)".to_string()
    } else {
        settings.channels.join(", ")
    };
    ui::kv("channels", &channels);

    if ctx.verbose > 0 {
        println!();
        ui::dim(&format!("Override the directory with {}", paths::ENV_CONFIG_DIR));
    }
    Ok(())
}
