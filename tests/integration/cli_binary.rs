//! Integration tests for the `synapse` binary: exit codes and log destinations.
//!
//! Only commands that never reach the generation backend are run here.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn synapse(home: &Path, vault: &Path, args: &[&str]) -> Output {
    let config_home = home.join("config");
    fs::create_dir_all(&config_home).unwrap();
    Command::new(env!("CARGO_BIN_EXE_synapse"))
        .env("HOME", home.as_os_str())
        .env("XDG_CONFIG_HOME", config_home.as_os_str())
        .env("NO_COLOR", "1")
        .env_remove("SYNAPSE_LOG")
        .env_remove("SYNAPSE_LOG_FORMAT")
        .env_remove("SYNAPSE_LOG_OUTPUT")
        .arg("--vault")
        .arg(vault)
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_config_init_writes_vault_file_and_logs_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let vault = temp_dir.path().join("vault");
    fs::create_dir_all(&vault).unwrap();

    let output = synapse(temp_dir.path(), &vault, &["config", "init"]);

    assert!(
        output.status.success(),
        "synapse config init should succeed: stderr={:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    let config_path = vault.join(".synapse").join("config.toml");
    assert!(config_path.exists());
    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains("generation_endpoint = \"http://localhost:11434\""));
    assert!(
        output.stderr.is_empty(),
        "logging is off without --verbose; stderr={:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(!vault.join(".synapse").join("synapse.log").exists());

    let again = synapse(temp_dir.path(), &vault, &["config", "init"]);
    assert_eq!(again.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&again.stderr).contains("already exists"));
}

#[test]
fn test_verbose_file_logging_writes_default_log_path() {
    let temp_dir = TempDir::new().unwrap();
    let vault = temp_dir.path().join("vault");
    fs::create_dir_all(&vault).unwrap();

    let output = synapse(
        temp_dir.path(),
        &vault,
        &[
            "--verbose",
            "--log-level",
            "debug",
            "--log-output",
            "file",
            "config",
            "show",
        ],
    );

    assert!(
        output.status.success(),
        "synapse config show should succeed: stderr={:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("model_name = \"gemma3n:e2b\""));

    let log_path = vault.join(".synapse").join("synapse.log");
    assert!(
        log_path.exists(),
        "log file should exist at {}",
        log_path.display()
    );
    let content = fs::read_to_string(&log_path).unwrap();
    assert!(
        content.contains("Synapse CLI starting"),
        "log file should contain a startup message; got: {}",
        content.lines().next().unwrap_or("")
    );
    assert!(content.contains("Command finished"));
}

#[test]
fn test_explicit_log_file_and_json_format() {
    let temp_dir = TempDir::new().unwrap();
    let vault = temp_dir.path().join("vault");
    fs::create_dir_all(&vault).unwrap();
    let log_file = temp_dir.path().join("logs").join("run.log");

    let output = synapse(
        temp_dir.path(),
        &vault,
        &[
            "--verbose",
            "--log-level",
            "info",
            "--log-format",
            "json",
            "--log-output",
            "file",
            "--log-file",
            log_file.to_str().unwrap(),
            "templates",
        ],
    );

    assert!(output.status.success());
    let content = fs::read_to_string(&log_file).unwrap();
    let first = content.lines().next().unwrap();
    let record: serde_json::Value = serde_json::from_str(first).unwrap();
    assert_eq!(record["level"], "INFO");
    assert!(String::from_utf8_lossy(&output.stdout).contains("No template notes found."));
}

#[test]
fn test_missing_note_maps_to_not_found_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let vault = temp_dir.path().join("vault");
    fs::create_dir_all(&vault).unwrap();

    let output = synapse(temp_dir.path(), &vault, &["summarize", "Missing.md"]);

    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).starts_with("Error: "));
}

#[test]
fn test_missing_config_file_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let vault = temp_dir.path().join("vault");
    fs::create_dir_all(&vault).unwrap();
    let missing = temp_dir.path().join("nope.toml");

    let output = synapse(
        temp_dir.path(),
        &vault,
        &["--config", missing.to_str().unwrap(), "config", "show"],
    );

    assert_eq!(output.status.code(), Some(3));
}
