//! Vault collaborator: note storage addressed by vault-relative paths.
//!
//! Paths use `/` separators and are NFC-normalized before they reach an
//! implementation, so `Explanations/Café.md` names one note regardless of how
//! the host composed it.

use crate::editor::Cursor;
use crate::error::SynapseError;
use tracing::warn;
use unicode_normalization::UnicodeNormalization;

mod fs;
mod memory;

pub use fs::FsVault;
pub use memory::MemoryVault;

/// Handle to a note the vault has written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteHandle {
    pub path: String,
}

impl NoteHandle {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// File name without folders or the `.md` extension.
    pub fn basename(&self) -> &str {
        note_basename(&self.path)
    }
}

/// The note currently open in the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDocument {
    pub path: String,
    pub text: String,
    pub cursor: Cursor,
}

impl ActiveDocument {
    pub fn basename(&self) -> &str {
        note_basename(&self.path)
    }
}

pub trait Vault: Send + Sync {
    /// Fails with `NotFound` when no note exists at `path`.
    fn read(&self, path: &str) -> Result<String, SynapseError>;

    /// Create a new note. Fails with `Conflict` when `path` already exists.
    fn create(&self, path: &str, text: &str) -> Result<NoteHandle, SynapseError>;

    /// Overwrite an existing note (or create it). Idempotent.
    fn modify(&self, path: &str, text: &str) -> Result<NoteHandle, SynapseError>;

    fn create_folder(&self, path: &str) -> Result<(), SynapseError>;

    fn exists(&self, path: &str) -> bool;

    /// Vault-relative paths of every markdown note.
    fn list_markdown(&self) -> Result<Vec<String>, SynapseError>;

    fn active_document(&self) -> Option<ActiveDocument>;

    /// Create every missing segment of `path`. Never fails; segment errors are logged.
    fn ensure_folder(&self, path: &str) {
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.trim().is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            if self.exists(&current) {
                continue;
            }
            if let Err(e) = self.create_folder(&current) {
                warn!(folder = %current, error = %e, "Failed to create folder");
            }
        }
    }
}

/// Normalize a vault-relative path: NFC, `/` separators, no leading `./` or `/`,
/// no empty segments, no trailing slash.
pub fn normalize_vault_path(path: &str) -> String {
    let normalized: String = path.nfc().collect();
    normalized
        .replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

pub fn note_basename(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.strip_suffix(".md").unwrap_or(name)
}

/// Wiki-link target for a note path (`.md` dropped).
pub fn link_target(path: &str) -> &str {
    path.strip_suffix(".md").unwrap_or(path)
}
