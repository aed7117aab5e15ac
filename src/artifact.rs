//! Note artifacts: explanation and flashcard notes composed from a generation result.

use crate::config::SynapseConfig;
use crate::error::SynapseError;
use crate::template::{TemplateContext, TemplateProcessor, DATE_FORMAT};
use crate::vault::{link_target, Vault};
use chrono::NaiveDate;
use tracing::debug;

pub const TITLE_MAX_CHARS: usize = 50;
pub const FLASHCARD_SUFFIX: &str = " - Flashcards";
pub const UNTITLED: &str = "Untitled";
pub const NEW_FLASHCARDS_HEADING: &str = "## New Flashcards";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Explanation,
    Flashcard,
}

/// A composed note, ready to be persisted by the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteArtifact {
    pub kind: NoteKind,
    pub path: String,
    pub title: String,
    pub body: String,
}

impl NoteArtifact {
    /// Wiki link to this note (`[[path|label]]`).
    pub fn link(&self, label: &str) -> String {
        format!("[[{}|{}]]", link_target(&self.path), label)
    }
}

/// Keep ASCII word characters, whitespace and `-`; collapse whitespace; trim;
/// cap at [`TITLE_MAX_CHARS`].
pub fn sanitize_title(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    let capped: String = collapsed.chars().take(TITLE_MAX_CHARS).collect();
    capped.trim_end().to_string()
}

fn in_folder(folder: &str, name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        format!("{}.md", name)
    } else {
        format!("{}/{}.md", folder, name)
    }
}

pub fn explanation_path(config: &SynapseConfig, title: &str) -> String {
    in_folder(&config.explanation_folder, title)
}

pub fn flashcard_path(config: &SynapseConfig, source_title: &str) -> String {
    in_folder(
        &config.flashcard_folder,
        &format!("{}{}", source_title, FLASHCARD_SUFFIX),
    )
}

/// Link appended to the cursor line after flashcards are generated.
pub fn flashcard_backlink(path: &str) -> String {
    format!("\n\n[[{}|Flashcards for this note]]\n", link_target(path))
}

/// New cards appended to an existing flashcard note.
pub fn append_flashcards(existing: &str, cards: &str) -> String {
    format!("{}\n\n{}\n\n{}", existing, NEW_FLASHCARDS_HEADING, cards)
}

/// What the artifact is about, gathered by the orchestrator before generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSource {
    /// Text the user selected.
    pub query: String,
    /// Vault path of the note the selection came from.
    pub source_path: Option<String>,
}

pub struct NoteArtifactBuilder<'a> {
    config: &'a SynapseConfig,
    templates: TemplateProcessor<'a>,
    today: NaiveDate,
}

impl<'a> NoteArtifactBuilder<'a> {
    pub fn new(config: &'a SynapseConfig, vault: &'a dyn Vault, today: NaiveDate) -> Self {
        Self {
            config,
            templates: TemplateProcessor::new(vault),
            today,
        }
    }

    /// Title the artifact will carry; empty when the selection has nothing usable.
    pub fn title(&self, kind: NoteKind, source: &ArtifactSource) -> String {
        match kind {
            NoteKind::Explanation => sanitize_title(&source.query),
            NoteKind::Flashcard => source
                .source_path
                .as_deref()
                .map(crate::vault::note_basename)
                .unwrap_or(UNTITLED)
                .to_string(),
        }
    }

    pub fn path(&self, kind: NoteKind, title: &str) -> String {
        match kind {
            NoteKind::Explanation => explanation_path(self.config, title),
            NoteKind::Flashcard => flashcard_path(self.config, title),
        }
    }

    fn uses_template(&self) -> bool {
        self.config.use_template_for_explanations && !self.config.template_path.trim().is_empty()
    }

    pub fn build(
        &self,
        kind: NoteKind,
        generated: &str,
        source: &ArtifactSource,
    ) -> Result<NoteArtifact, SynapseError> {
        let title = self.title(kind, source);
        if title.is_empty() {
            return Err(SynapseError::Input(
                "Selection has no characters usable in a note title".to_string(),
            ));
        }
        let path = self.path(kind, &title);
        let date = self.today.format(DATE_FORMAT).to_string();
        let tags = self.config.tags_string();

        let body = if self.uses_template() {
            let mut context = TemplateContext::builtins(self.config, self.today)
                .with("title", title.as_str())
                .with("content", generated)
                .with("query", source.query.as_str())
                .with("tags", tags.as_str());
            context.extend_custom(&self.config.custom_template_variables);
            self.templates
                .process(self.config.template_path.trim(), &context)?
        } else {
            let tags_line = if tags.is_empty() {
                String::new()
            } else {
                format!("\ntags: {}", tags)
            };
            match kind {
                NoteKind::Explanation => format!(
                    "# {}{}\n\n{}\n\n---\n*Generated by Synapse AI*\n*Created: {}*",
                    title, tags_line, generated, date
                ),
                NoteKind::Flashcard => {
                    let origin = source
                        .source_path
                        .as_deref()
                        .map(link_target)
                        .unwrap_or("Unknown source");
                    format!(
                        "# Flashcards for {}{}\n\n{}\n\n---\n*Generated from: [[{}]]*\n*Created: {}*\n",
                        title, tags_line, generated, origin, date
                    )
                }
            }
        };

        debug!(?kind, path = %path, bytes = body.len(), "Built note artifact");
        Ok(NoteArtifact {
            kind,
            path,
            title,
            body,
        })
    }
}
