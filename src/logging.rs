//! Logging System
//!
//! Structured logging using the `tracing` crate. Level, format and destination
//! come from the `[logging]` config table, overridable through `SYNAPSE_LOG`,
//! `SYNAPSE_LOG_FORMAT` and `SYNAPSE_LOG_OUTPUT`.

use crate::error::SynapseError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off
    pub level: String,

    /// Output format: json, text
    pub format: String,

    /// Output destination: stdout, stderr, file
    pub output: String,

    /// Log file path (output = "file")
    pub file: Option<PathBuf>,

    /// Enable colored output (text format, terminal destinations only)
    pub color: bool,

    /// Module-specific log levels
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "warn".to_string(),
            format: "text".to_string(),
            output: "stderr".to_string(),
            file: None,
            color: true,
            modules: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Stdout,
    Stderr,
    File,
}

fn parse_output(output: &str) -> Result<Output, SynapseError> {
    match output {
        "stdout" => Ok(Output::Stdout),
        "stderr" => Ok(Output::Stderr),
        "file" => Ok(Output::File),
        _ => Err(SynapseError::Config(format!(
            "Invalid log output: {} (must be 'stdout', 'stderr' or 'file')",
            output
        ))),
    }
}

/// Determine output format from config or environment
fn determine_format(config: &LoggingConfig) -> Result<String, SynapseError> {
    if let Ok(format) = std::env::var("SYNAPSE_LOG_FORMAT") {
        if format == "json" || format == "text" {
            return Ok(format);
        }
    }
    match config.format.as_str() {
        "json" | "text" => Ok(config.format.clone()),
        other => Err(SynapseError::Config(format!(
            "Invalid log format: {} (must be 'json' or 'text')",
            other
        ))),
    }
}

fn determine_output(config: &LoggingConfig) -> Result<Output, SynapseError> {
    match std::env::var("SYNAPSE_LOG_OUTPUT") {
        Ok(output) => parse_output(&output),
        Err(_) => parse_output(&config.output),
    }
}

/// Build the filter from `SYNAPSE_LOG` or the configured level and module overrides.
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, SynapseError> {
    if let Ok(filter) = EnvFilter::try_from_env("SYNAPSE_LOG") {
        return Ok(filter);
    }
    if !config.enabled || config.level == "off" {
        return Ok(EnvFilter::new("off"));
    }

    let mut filter = EnvFilter::new(&config.level);
    for (module, level) in &config.modules {
        let directive = format!("{}={}", module, level);
        filter = filter.add_directive(
            directive
                .parse()
                .map_err(|e| SynapseError::Config(format!("Invalid log directive: {}", e)))?,
        );
    }
    Ok(filter)
}

fn make_writer(config: &LoggingConfig, output: Output) -> Result<BoxMakeWriter, SynapseError> {
    match output {
        Output::Stdout => Ok(BoxMakeWriter::new(std::io::stdout)),
        Output::Stderr => Ok(BoxMakeWriter::new(std::io::stderr)),
        Output::File => {
            let path = config.file.clone().ok_or_else(|| {
                SynapseError::Config("log output 'file' requires logging.file".to_string())
            })?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SynapseError::Config(format!("Failed to create log directory: {}", e))
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| {
                    SynapseError::Config(format!("Failed to open log file {:?}: {}", path, e))
                })?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
    }
}

/// Initialize the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), SynapseError> {
    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let output = determine_output(config)?;
    let writer = make_writer(config, output)?;
    let ansi = config.color && output != Output::File;

    let registry = Registry::default().with(filter);
    let result = if format == "json" {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_writer(writer),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init()
    };

    result.map_err(|e| SynapseError::Config(format!("Failed to install logger: {}", e)))
}
