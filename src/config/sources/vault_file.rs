//! Vault config file source: `<vault>/.synapse/config.toml`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::{Path, PathBuf};

pub const VAULT_CONFIG_DIR: &str = ".synapse";

pub fn vault_config_path(vault_root: &Path) -> PathBuf {
    vault_root.join(VAULT_CONFIG_DIR).join("config.toml")
}

/// Add the vault config file to the builder when it exists.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    vault_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let path = vault_config_path(vault_root);
    if !path.exists() {
        return Ok(builder);
    }
    Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(false)))
}
