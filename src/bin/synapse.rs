//! Synapse CLI Binary
//!
//! Command-line host for the Synapse generation core.

use anyhow::Context;
use clap::Parser;
use std::process;
use synapse::cli::{exit_code, map_error, Cli, RunContext};
use synapse::config::ConfigLoader;
use synapse::logging::{init_logging, LoggingConfig};
use synapse::SynapseError;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    // Build logging config from CLI args, env vars, and config file
    let logging_config = build_logging_config(&cli);

    // Initialize logging early
    if let Err(e) = init_logging(&logging_config) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Synapse CLI starting");

    match run(&cli) {
        Ok(output) => {
            info!("Command completed successfully");
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            match e.downcast_ref::<SynapseError>() {
                Some(err) => {
                    eprintln!("{}", map_error(err));
                    process::exit(exit_code(err));
                }
                None => {
                    eprintln!("Error: {:#}", e);
                    process::exit(1);
                }
            }
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let context = RunContext::new(cli.vault.clone(), cli.config.clone())
        .with_context(|| format!("Failed to open vault {}", cli.vault.display()))?;
    info!("CLI context initialized");
    Ok(context.execute(&cli.command)?)
}

/// Build logging configuration from CLI args, environment, and config file
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    // If --verbose is not set, disable logging
    if !cli.verbose {
        return LoggingConfig {
            level: "off".to_string(),
            ..LoggingConfig::default()
        };
    }

    // Try to load config file first
    let mut config = match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path)
            .map(|c| c.logging)
            .unwrap_or_default(),
        None => ConfigLoader::load(&cli.vault)
            .map(|c| c.logging)
            .unwrap_or_default(),
    };

    // Override with CLI arguments (highest priority)
    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        config.file = Some(file.clone());
    } else if config.output == "file" && config.file.is_none() {
        config.file = Some(
            ConfigLoader::vault_config_path(&cli.vault)
                .with_file_name("synapse.log"),
        );
    }

    config
}
