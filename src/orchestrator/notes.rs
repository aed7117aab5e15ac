//! Explanation and flashcard notes.

use super::{GenerationOrchestrator, Notice};
use crate::artifact::{
    append_flashcards, flashcard_backlink, ArtifactSource, NoteArtifact, NoteArtifactBuilder,
    NoteKind,
};
use crate::config::{PromptKind, SynapseConfig};
use crate::editor::Editor;
use crate::error::SynapseError;
use crate::provider::GenerationRequest;
use tracing::{debug, info};

/// Result of `create_flashcards`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardOutcome {
    pub path: String,
    /// True when the cards were appended to an existing note.
    pub appended: bool,
}

impl GenerationOrchestrator {
    /// Explain the selection in a new note and replace the selection with a link to it.
    pub async fn explain_and_link(
        &self,
        editor: &dyn Editor,
        config: &SynapseConfig,
    ) -> Result<NoteArtifact, SynapseError> {
        match self.try_explain_and_link(editor, config).await {
            Ok(artifact) => {
                self.notify(Notice::success(format!(
                    "Created and linked note: {}",
                    artifact.title
                )));
                Ok(artifact)
            }
            Err(e) => self.report("explain_and_link", e),
        }
    }

    async fn try_explain_and_link(
        &self,
        editor: &dyn Editor,
        config: &SynapseConfig,
    ) -> Result<NoteArtifact, SynapseError> {
        let selection = editor.selection();
        if selection.trim().is_empty() {
            return Err(SynapseError::Input("Please select text to explain".to_string()));
        }

        let builder = NoteArtifactBuilder::new(config, self.vault(), self.clock.today());
        let source = ArtifactSource {
            query: selection.clone(),
            source_path: self.vault.active_document().map(|doc| doc.path),
        };
        let title = builder.title(NoteKind::Explanation, &source);
        if title.is_empty() {
            return Err(SynapseError::Input(
                "Selection has no characters usable in a note title".to_string(),
            ));
        }
        let path = builder.path(NoteKind::Explanation, &title);
        if self.vault.exists(&path) {
            return Err(SynapseError::Conflict(title));
        }

        let request = GenerationRequest::new(
            format!("Explain this concept: \"{}\"", selection),
            self.system_prompt(config, PromptKind::Explanation),
        );
        let explanation = self.generate("explain_and_link", request).await?;

        self.vault.ensure_folder(&config.explanation_folder);
        let artifact = builder.build(NoteKind::Explanation, &explanation, &source)?;
        self.vault.create(&artifact.path, &artifact.body)?;
        info!(path = %artifact.path, "Created explanation note");

        let link = artifact.link(&artifact.title);
        if editor.selection() == selection {
            editor.replace_selection(&link);
        } else {
            // Selection moved during generation; anchor on the selected text instead.
            let current = editor.value();
            if current.contains(&selection) {
                debug!("Selection changed; linking first occurrence of the selected text");
                editor.set_value(&current.replacen(&selection, &link, 1));
            } else {
                debug!("Selected text gone; inserting link at the cursor");
                editor.replace_range(&link, editor.cursor());
            }
        }
        Ok(artifact)
    }

    /// Generate flashcards from the selection into the source note's flashcard note.
    pub async fn create_flashcards(
        &self,
        editor: &dyn Editor,
        config: &SynapseConfig,
    ) -> Result<FlashcardOutcome, SynapseError> {
        match self.try_create_flashcards(editor, config).await {
            Ok(outcome) => {
                let message = if outcome.appended {
                    "Added flashcards to existing note"
                } else {
                    "Created new flashcards note"
                };
                self.notify(Notice::success(message));
                Ok(outcome)
            }
            Err(e) => self.report("create_flashcards", e),
        }
    }

    async fn try_create_flashcards(
        &self,
        editor: &dyn Editor,
        config: &SynapseConfig,
    ) -> Result<FlashcardOutcome, SynapseError> {
        let selection = editor.selection();
        if selection.trim().is_empty() {
            return Err(SynapseError::Input(
                "Please select text to create flashcards from".to_string(),
            ));
        }

        let request = GenerationRequest::new(
            format!("Create flashcards from this content:\n\n{}", selection),
            self.system_prompt(config, PromptKind::Flashcard),
        );
        let cards = self.generate("create_flashcards", request).await?;

        let builder = NoteArtifactBuilder::new(config, self.vault(), self.clock.today());
        let source = ArtifactSource {
            query: selection,
            source_path: self.vault.active_document().map(|doc| doc.path),
        };
        self.vault.ensure_folder(&config.flashcard_folder);
        let title = builder.title(NoteKind::Flashcard, &source);
        let path = builder.path(NoteKind::Flashcard, &title);

        let appended = if self.vault.exists(&path) {
            self.append_cards(&path, &cards)?;
            true
        } else {
            let artifact = builder.build(NoteKind::Flashcard, &cards, &source)?;
            match self.vault.create(&artifact.path, &artifact.body) {
                Ok(_) => false,
                Err(SynapseError::Conflict(_)) => {
                    self.append_cards(&path, &cards)?;
                    true
                }
                Err(e) => return Err(e),
            }
        };
        info!(path = %path, appended, "Wrote flashcards");

        let cursor = editor.cursor();
        let line = editor.line(cursor.line).unwrap_or_default();
        editor.set_line(cursor.line, &format!("{}{}", line, flashcard_backlink(&path)));

        Ok(FlashcardOutcome { path, appended })
    }

    fn append_cards(&self, path: &str, cards: &str) -> Result<(), SynapseError> {
        let existing = self.vault.read(path)?;
        self.vault.modify(path, &append_flashcards(&existing, cards))?;
        Ok(())
    }
}
