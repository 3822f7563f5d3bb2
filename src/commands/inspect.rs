//! Read-only environment queries.

use anyhow::{Context as _, Result};
use colored::Colorize;
use condakit::Client;
use std::process::ExitCode;

use crate::Context;
use crate::cli::EnvArgs;
use crate::config::Config;
use crate::ui;

fn client(args: &EnvArgs) -> Result<(Client, String)> {
    let config = Config::load()?;
    let settings = config.settings(
        args.environment.as_deref(),
        args.executable.as_deref(),
        &[],
        false,
    );
    let client = Client::new(&settings).context("Could not set up conda")?;
    Ok((client, settings.environment))
}

pub fn list(ctx: &Context, args: EnvArgs) -> Result<ExitCode> {
    let (client, env) = client(&args)?;
    let packages = client
        .list_installed()
        .with_context(|| format!("Could not list packages in {env}"))?;

    if !ctx.quiet {
        ui::header(&format!("Packages in {env}"));
        ui::dim(&format!("Using: {}", client.executable().display()));
        println!();
    }

    let width = packages.iter().map(|p| p.name.len()).max().unwrap_or(0);
    for pkg in &packages {
        println!(
            "  {:<width$}  {:<12}  {}",
            pkg.name,
            pkg.version.as_deref().unwrap_or("-").green(),
            pkg.channel.as_deref().unwrap_or("").dimmed(),
        );
    }

    if !ctx.quiet {
        println!();
        ui::info(&format!("{} packages", packages.len()));
    }
    Ok(ExitCode::SUCCESS)
}

pub fn exists(ctx: &Context, args: EnvArgs) -> Result<ExitCode> {
    let (client, env) = client(&args)?;
    let found = client.env_exists()?;

    if !ctx.quiet {
        if found {
            ui::success(&format!("Environment {env} exists"));
        } else {
            ui::warn(&format!("Environment {env} does not exist"));
        }
    }

    Ok(if found {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
