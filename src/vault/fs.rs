//! Filesystem-backed vault rooted at a directory.

use super::{normalize_vault_path, ActiveDocument, NoteHandle, Vault};
use crate::editor::Cursor;
use crate::error::SynapseError;
use parking_lot::RwLock;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

pub struct FsVault {
    root: PathBuf,
    active: RwLock<Option<(String, Cursor)>>,
}

impl FsVault {
    /// Open a vault at `root`, which must be an existing directory.
    pub fn open(root: &Path) -> Result<Self, SynapseError> {
        let root = dunce::canonicalize(root).map_err(|e| {
            SynapseError::NotFound(format!("vault root {}: {}", root.display(), e))
        })?;
        if !root.is_dir() {
            return Err(SynapseError::NotFound(format!(
                "vault root {} is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root,
            active: RwLock::new(None),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Mark `path` as the note open in the host.
    pub fn set_active(&self, path: &str, cursor: Cursor) {
        *self.active.write() = Some((normalize_vault_path(path), cursor));
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, SynapseError> {
        let relative = PathBuf::from(normalize_vault_path(path));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(SynapseError::Input(format!(
                "Path escapes the vault: {}",
                path
            )));
        }
        Ok(self.root.join(relative))
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        Some(normalize_vault_path(&parts.join("/")))
    }
}

/// Write a freshly created note; a failed write removes the partial file so a
/// retry is not reported as a conflict.
fn write_or_discard<W: Write>(full: &Path, writer: &mut W, text: &str) -> Result<(), SynapseError> {
    if let Err(e) = writer.write_all(text.as_bytes()).and_then(|_| writer.flush()) {
        if let Err(remove) = fs::remove_file(full) {
            warn!(path = %full.display(), error = %remove, "Failed to remove partial note");
        }
        return Err(SynapseError::Io(e));
    }
    Ok(())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

impl Vault for FsVault {
    fn read(&self, path: &str) -> Result<String, SynapseError> {
        let full = self.resolve(path)?;
        match fs::read_to_string(&full) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SynapseError::NotFound(normalize_vault_path(path)))
            }
            Err(e) => Err(SynapseError::Io(e)),
        }
    }

    fn create(&self, path: &str, text: &str) -> Result<NoteHandle, SynapseError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(SynapseError::Conflict(normalize_vault_path(path)))
            }
            Err(e) => return Err(SynapseError::Io(e)),
        };
        write_or_discard(&full, &mut file, text)?;
        debug!(path = %full.display(), bytes = text.len(), "Created note");
        Ok(NoteHandle::new(normalize_vault_path(path)))
    }

    fn modify(&self, path: &str, text: &str) -> Result<NoteHandle, SynapseError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full, text)?;
        debug!(path = %full.display(), bytes = text.len(), "Wrote note");
        Ok(NoteHandle::new(normalize_vault_path(path)))
    }

    fn create_folder(&self, path: &str) -> Result<(), SynapseError> {
        let full = self.resolve(path)?;
        fs::create_dir(&full)?;
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn list_markdown(&self) -> Result<Vec<String>, SynapseError> {
        let mut notes = Vec::new();
        for entry in WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
        {
            let entry = entry.map_err(|e| SynapseError::Io(e.into()))?;
            let is_markdown = entry.file_type().is_file()
                && entry.path().extension().map(|ext| ext == "md").unwrap_or(false);
            if !is_markdown {
                continue;
            }
            if let Some(rel) = self.relative(entry.path()) {
                notes.push(rel);
            }
        }
        notes.sort();
        Ok(notes)
    }

    fn active_document(&self) -> Option<ActiveDocument> {
        let (path, cursor) = self.active.read().clone()?;
        let text = self.read(&path).ok()?;
        Some(ActiveDocument { path, text, cursor })
    }
}
