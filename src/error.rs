//! Error types for the Synapse generation core.

use thiserror::Error;

/// Coarse error category surfaced to hosts (notification styling, exit codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    NotFound,
    Conflict,
    Transport,
    Parse,
    Template,
    Config,
    Io,
}

/// Errors produced by the transformation core and its collaborators
#[derive(Debug, Error)]
pub enum SynapseError {
    /// Empty selection or document; recovered locally.
    #[error("{0}")]
    Input(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Note \"{0}\" already exists")]
    Conflict(String),

    #[error("Failed to generate response: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed document structure: {0}")]
    Parse(String),

    #[error("Failed to process template: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SynapseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SynapseError::Input(_) => ErrorKind::Input,
            SynapseError::NotFound(_) => ErrorKind::NotFound,
            SynapseError::Conflict(_) => ErrorKind::Conflict,
            SynapseError::Transport { .. } => ErrorKind::Transport,
            SynapseError::Parse(_) => ErrorKind::Parse,
            SynapseError::Template(_) => ErrorKind::Template,
            SynapseError::Config(_) => ErrorKind::Config,
            SynapseError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        SynapseError::Transport {
            status,
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for SynapseError {
    fn from(err: config::ConfigError) -> Self {
        SynapseError::Config(err.to_string())
    }
}
