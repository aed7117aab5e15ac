//! Merge rules: defaults, override order, conflict handling.
//!
//! Later sources win key by key; absent keys fall through to the built-in
//! defaults of [`SynapseConfig`].

use crate::config::SynapseConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment};

/// Environment prefix; `SYNAPSE__MODEL_NAME` overrides `model_name`.
pub const ENV_PREFIX: &str = "SYNAPSE";
pub const ENV_SEPARATOR: &str = "__";

/// Create a Config builder seeded with the built-in defaults.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&SynapseConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}

/// Environment overrides, applied last.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}
