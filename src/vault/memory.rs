//! In-memory vault for hosts without a filesystem and for tests.

use super::{normalize_vault_path, ActiveDocument, NoteHandle, Vault};
use crate::editor::Cursor;
use crate::error::SynapseError;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
pub struct MemoryVault {
    notes: RwLock<BTreeMap<String, String>>,
    folders: RwLock<BTreeSet<String>>,
    active: RwLock<Option<(String, Cursor)>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a note unconditionally.
    pub fn insert(&self, path: &str, text: &str) {
        self.notes
            .write()
            .insert(normalize_vault_path(path), text.to_string());
    }

    pub fn set_active(&self, path: &str, cursor: Cursor) {
        *self.active.write() = Some((normalize_vault_path(path), cursor));
    }

    pub fn note_count(&self) -> usize {
        self.notes.read().len()
    }
}

impl Vault for MemoryVault {
    fn read(&self, path: &str) -> Result<String, SynapseError> {
        let path = normalize_vault_path(path);
        self.notes
            .read()
            .get(&path)
            .cloned()
            .ok_or(SynapseError::NotFound(path))
    }

    fn create(&self, path: &str, text: &str) -> Result<NoteHandle, SynapseError> {
        let path = normalize_vault_path(path);
        let mut notes = self.notes.write();
        if notes.contains_key(&path) {
            return Err(SynapseError::Conflict(path));
        }
        notes.insert(path.clone(), text.to_string());
        Ok(NoteHandle::new(path))
    }

    fn modify(&self, path: &str, text: &str) -> Result<NoteHandle, SynapseError> {
        let path = normalize_vault_path(path);
        self.notes.write().insert(path.clone(), text.to_string());
        Ok(NoteHandle::new(path))
    }

    fn create_folder(&self, path: &str) -> Result<(), SynapseError> {
        self.folders.write().insert(normalize_vault_path(path));
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        let path = normalize_vault_path(path);
        self.notes.read().contains_key(&path) || self.folders.read().contains(&path)
    }

    fn list_markdown(&self) -> Result<Vec<String>, SynapseError> {
        Ok(self
            .notes
            .read()
            .keys()
            .filter(|p| p.ends_with(".md"))
            .cloned()
            .collect())
    }

    fn active_document(&self) -> Option<ActiveDocument> {
        let (path, cursor) = self.active.read().clone()?;
        let text = self.notes.read().get(&path).cloned().unwrap_or_default();
        Some(ActiveDocument { path, text, cursor })
    }
}
