//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ErrorKind, SynapseError};

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &SynapseError) -> String {
    format!("Error: {}", e)
}

/// Process exit code per error category.
pub fn exit_code(e: &SynapseError) -> i32 {
    match e.kind() {
        ErrorKind::Input => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Conflict => 4,
        ErrorKind::Transport => 5,
        ErrorKind::Config => 6,
        ErrorKind::Parse | ErrorKind::Template | ErrorKind::Io => 1,
    }
}
