//! Config loading facade: assembles sources in precedence order.

use super::merge::merge_policy;
use super::sources::{global_file, vault_file};
use super::SynapseConfig;
use crate::error::SynapseError;
use config::{File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings for a vault.
    ///
    /// Precedence (highest first): `SYNAPSE__*` environment variables, the
    /// vault's `.synapse/config.toml`, the user config file, built-in defaults.
    pub fn load(vault_root: &Path) -> Result<SynapseConfig, SynapseError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = vault_file::add_to_builder(builder, vault_root)?;
        let config: SynapseConfig = builder
            .add_source(merge_policy::environment())
            .build()?
            .try_deserialize()?;
        debug!(vault = %vault_root.display(), model = %config.model_name, "Configuration loaded");
        Ok(config)
    }

    /// Load from one explicit file (over defaults), ignoring the other layers.
    pub fn load_from_file(path: &Path) -> Result<SynapseConfig, SynapseError> {
        if !path.exists() {
            return Err(SynapseError::NotFound(format!(
                "config file {}",
                path.display()
            )));
        }
        let config = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).format(FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(config)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    pub fn vault_config_path(vault_root: &Path) -> PathBuf {
        vault_file::vault_config_path(vault_root)
    }
}
