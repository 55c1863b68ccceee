use anyhow::{Context, Result};
use colored::*;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{ConfigError, ConfigResolver, OutputTarget, RawArguments, Resolution};

use super::args::Cli;

pub(crate) async fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose);

    // The config error already renders as one self-contained line
    let resolution = resolve(cli.into_raw_arguments())
        .await
        .inspect_err(|err| tracing::debug!(kind = ?err.kind(), "resolution failed"))?;

    print_summary(&resolution);
    let rendered = serde_json::to_string_pretty(&resolution.config)
        .context("Failed to serialize resolved configuration")?;
    println!("{rendered}");
    Ok(())
}

async fn resolve(args: RawArguments) -> std::result::Result<Resolution, ConfigError> {
    ConfigResolver::builder(args).build().await?.resolve().await
}

/// Logs go to stderr so stdout stays machine readable.
fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .try_init();
}

fn print_summary(resolution: &Resolution) {
    let config = &resolution.config;
    let source = match &config.config_file {
        Some(path) => path.display().to_string(),
        None => "no configuration file".to_string(),
    };
    let destination = match &config.output {
        OutputTarget::Derived => "next to each input".to_string(),
        OutputTarget::File(path) => path.display().to_string(),
        OutputTarget::Stdout => "stdout".to_string(),
        OutputTarget::Disabled => "served, not written".to_string(),
    };

    eprintln!(
        "{} {} -> {} ({})",
        "Resolved".bold().green(),
        source.dimmed(),
        config.kind.to_string().bold(),
        destination
    );

    if !config.themes.is_empty() {
        let names: Vec<_> = config.themes.names().collect();
        eprintln!("  {} {}", "themes:".dimmed(), names.join(", "));
    }

    // the messages themselves were already logged while resolving
    let warnings = resolution.diagnostics.len();
    if warnings > 0 {
        eprintln!("  {}", format!("{warnings} warning(s)").yellow());
    }
}
