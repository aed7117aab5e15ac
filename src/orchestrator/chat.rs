//! Chat sessions embedded in notes.

use super::{GenerationOrchestrator, Notice};
use crate::chat::{session_note, ChatExchange, CommittedText};
use crate::config::{PromptKind, SynapseConfig};
use crate::editor::{Cursor, Editor};
use crate::error::SynapseError;
use crate::provider::GenerationRequest;
use chrono::SecondsFormat;
use tracing::{debug, info};

/// A freshly created chat note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    pub path: String,
    pub text: String,
    /// Position of the empty prompt.
    pub cursor: Cursor,
}

impl GenerationOrchestrator {
    /// Create a new chat note in the chat folder.
    pub fn start_chat_session(&self, config: &SynapseConfig) -> Result<ChatSession, SynapseError> {
        let now = self.clock.now();
        let stamp = now
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace(&[':', '.'][..], "-");
        let folder = config.chat_folder.trim_matches('/');
        let path = if folder.is_empty() {
            format!("Chat-{}.md", stamp)
        } else {
            format!("{}/Chat-{}.md", folder, stamp)
        };
        let started = now.format("%Y-%m-%d %H:%M:%S").to_string();
        let (text, cursor) = session_note(&started, &config.tags_string());

        self.vault.ensure_folder(folder);
        if let Err(e) = self.vault.create(&path, &text) {
            return self.report("start_chat_session", e);
        }
        info!(path = %path, "Started chat session");
        self.notify(Notice::success("Started new chat session"));
        Ok(ChatSession { path, text, cursor })
    }

    /// Answer the prompt at or above the cursor.
    ///
    /// The placeholder goes in before the generation call; afterwards it is
    /// found again by content and replaced by the reply (or the error turn).
    pub async fn send_chat_message(
        &self,
        editor: &dyn Editor,
        config: &SynapseConfig,
    ) -> Result<CommittedText, SynapseError> {
        let mut exchange = ChatExchange::new();
        let doc = editor.value();
        let cursor_line = editor.cursor().line;

        let pending = match exchange
            .capture(&doc, cursor_line)
            .and_then(|_| exchange.begin(&doc, cursor_line))
        {
            Ok(pending) => pending,
            Err(e) => return self.report("send_chat_message", e),
        };
        editor.set_value(&pending);
        debug!(phase = %exchange.phase(), message = %exchange.message(), "Chat prompt captured");

        let request = GenerationRequest::new(
            exchange.message(),
            self.system_prompt(config, PromptKind::Chat),
        )
        .with_history(exchange.history());

        match self.generate("send_chat_message", request).await {
            Ok(response) => {
                let committed = exchange.commit(&editor.value(), &response)?;
                editor.set_value(&committed.text);
                editor.set_cursor(committed.cursor);
                exchange.finish();
                self.notify(Notice::info("Synapse replied"));
                Ok(committed)
            }
            Err(e) => {
                let failed = exchange.fail(&editor.value())?;
                editor.set_value(&failed);
                exchange.finish();
                self.report("send_chat_message", e)
            }
        }
    }
}
