//! Live continuation suggestions (ghost text).

use super::{GenerationOrchestrator, Notice};
use crate::config::{PromptKind, SynapseConfig};
use crate::editor::{Cursor, Editor};
use crate::error::SynapseError;
use crate::provider::GenerationRequest;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

pub const SUGGESTION_PREVIEW_CHARS: usize = 50;
const CONTEXT_LINES_BEFORE: usize = 10;
const CONTEXT_LINES_AFTER: usize = 5;
const MIN_CONTEXT_CHARS: usize = 5;

/// An ephemeral continuation offered at a cursor position. Never persisted
/// unless accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub at: Cursor,
}

impl Suggestion {
    pub fn preview(&self) -> String {
        let mut preview: String = self.text.chars().take(SUGGESTION_PREVIEW_CHARS).collect();
        if self.text.chars().count() > SUGGESTION_PREVIEW_CHARS {
            preview.push_str("...");
        }
        preview
    }
}

/// Lines `[cursor - 10, cursor + 5)` around the cursor.
fn suggestion_context(doc: &str, cursor_line: usize) -> String {
    let lines: Vec<&str> = doc.split('\n').collect();
    let start = cursor_line.saturating_sub(CONTEXT_LINES_BEFORE).min(lines.len());
    let end = (cursor_line + CONTEXT_LINES_AFTER).min(lines.len()).max(start);
    lines[start..end].join("\n")
}

impl GenerationOrchestrator {
    /// Suggest a short continuation for the text around the cursor.
    ///
    /// Returns `None` when suggestions are disabled, the context is too short
    /// or the backend failed; failures are logged, not shown.
    pub async fn generate_live_suggestion(
        &self,
        editor: &dyn Editor,
        config: &SynapseConfig,
    ) -> Result<Option<Suggestion>, SynapseError> {
        if !config.enable_live_suggestions {
            return Ok(None);
        }
        let cursor = editor.cursor();
        let context = suggestion_context(&editor.value(), cursor.line);
        if context.trim().chars().count() < MIN_CONTEXT_CHARS {
            debug!(line = cursor.line, "Not enough context for a suggestion");
            return Ok(None);
        }

        let request = GenerationRequest::new(
            format!("Continue this text: {}", context),
            self.system_prompt(config, PromptKind::Suggestion),
        );
        let text = match self.generate("generate_live_suggestion", request).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => return Ok(None),
            Err(e) => {
                warn!(error = %e, "Suggestion error");
                return Ok(None);
            }
        };

        let suggestion = Suggestion {
            text,
            at: editor.cursor(),
        };
        if config.show_ghost_text {
            self.notify(Notice::info(format!("Suggestion: {}", suggestion.preview())));
        }
        Ok(Some(suggestion))
    }

    /// Insert an accepted suggestion at the current cursor.
    pub fn accept_suggestion(
        &self,
        editor: &dyn Editor,
        config: &SynapseConfig,
        suggestion: &Suggestion,
    ) -> Result<(), SynapseError> {
        if !config.allow_quick_accept {
            return self.report(
                "accept_suggestion",
                SynapseError::Input("Quick accept is disabled".to_string()),
            );
        }
        editor.replace_range(&suggestion.text, editor.cursor());
        Ok(())
    }
}

/// Delays work and keeps only the most recently scheduled call.
#[derive(Debug)]
pub struct SuggestionDebouncer {
    delay: Duration,
    latest: AtomicU64,
}

impl SuggestionDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            latest: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &SynapseConfig) -> Self {
        Self::new(Duration::from_millis(config.suggestion_delay_ms))
    }

    /// Wait out the delay, then run `task` unless a newer call was scheduled
    /// meanwhile. Superseded calls return `None`.
    pub async fn schedule<F, Fut, T>(&self, task: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if self.latest.load(Ordering::SeqCst) != ticket {
            debug!(ticket, "Suggestion superseded");
            return None;
        }
        Some(task().await)
    }
}
