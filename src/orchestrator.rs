//! Generation orchestrator
//!
//! Ties one user operation to one generation call: gather context from the
//! editor, render the request, await the provider, then commit the result with
//! a single document replacement or vault write. The provider call is the only
//! suspension point; every position used at commit time is re-derived from the
//! document as it is after the await.

mod chat;
mod notes;
mod suggestion;
mod summary;

pub use chat::ChatSession;
pub use notes::FlashcardOutcome;
pub use suggestion::{Suggestion, SuggestionDebouncer, SUGGESTION_PREVIEW_CHARS};
pub use summary::{place_summary, summary_section, SummaryPlacement};

use crate::artifact::NoteArtifact;
use crate::chat::CommittedText;
use crate::config::{PromptKind, SynapseConfig};
use crate::editor::Editor;
use crate::error::SynapseError;
use crate::provider::{GenerationProvider, GenerationRequest};
use crate::template::{render, TemplateContext};
use crate::vault::Vault;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// User-visible confirmation or error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Where notices go: the host's notification area, a terminal, a test log.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Collects notices in order.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }

    pub fn snapshot(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().last().cloned()
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant.
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Explicit user actions a host dispatches to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    ExplainSelection,
    SummarizeNote,
    CreateFlashcards,
    StartChatSession,
    SendChatMessage,
    SuggestContinuation,
    AcceptSuggestion(Suggestion),
}

/// What a dispatched intent produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    Explained(NoteArtifact),
    Summarized(SummaryPlacement),
    Flashcards(FlashcardOutcome),
    ChatStarted(ChatSession),
    ChatCommitted(CommittedText),
    Suggested(Option<Suggestion>),
    SuggestionAccepted,
}

pub struct GenerationOrchestrator {
    provider: Arc<dyn GenerationProvider>,
    vault: Arc<dyn Vault>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
}

impl GenerationOrchestrator {
    pub fn new(
        provider: Arc<dyn GenerationProvider>,
        vault: Arc<dyn Vault>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_clock(provider, vault, notifier, Arc::new(SystemClock))
    }

    pub fn with_clock(
        provider: Arc<dyn GenerationProvider>,
        vault: Arc<dyn Vault>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            vault,
            notifier,
            clock,
        }
    }

    pub fn provider(&self) -> &dyn GenerationProvider {
        self.provider.as_ref()
    }

    pub fn vault(&self) -> &dyn Vault {
        self.vault.as_ref()
    }

    /// Startup health check; reports the result as a notice.
    pub async fn check_health(&self, config: &SynapseConfig) -> bool {
        let available = self.provider.is_available().await;
        if available {
            info!(endpoint = %config.endpoint(), "Generation backend reachable");
            self.notifier
                .notify(Notice::success("Synapse: Connected to Ollama successfully"));
        } else {
            warn!(endpoint = %config.endpoint(), "Generation backend unreachable");
            self.notifier.notify(Notice::error(format!(
                "Synapse: Cannot connect to Ollama. Please make sure Ollama is running on {}",
                config.endpoint()
            )));
        }
        available
    }

    /// Route an intent to its operation.
    pub async fn dispatch(
        &self,
        intent: UserIntent,
        editor: &dyn Editor,
        config: &SynapseConfig,
    ) -> Result<IntentOutcome, SynapseError> {
        debug!(?intent, "Dispatching user intent");
        match intent {
            UserIntent::ExplainSelection => self
                .explain_and_link(editor, config)
                .await
                .map(IntentOutcome::Explained),
            UserIntent::SummarizeNote => self
                .summarize_note(editor, config)
                .await
                .map(IntentOutcome::Summarized),
            UserIntent::CreateFlashcards => self
                .create_flashcards(editor, config)
                .await
                .map(IntentOutcome::Flashcards),
            UserIntent::StartChatSession => self
                .start_chat_session(config)
                .map(IntentOutcome::ChatStarted),
            UserIntent::SendChatMessage => self
                .send_chat_message(editor, config)
                .await
                .map(IntentOutcome::ChatCommitted),
            UserIntent::SuggestContinuation => self
                .generate_live_suggestion(editor, config)
                .await
                .map(IntentOutcome::Suggested),
            UserIntent::AcceptSuggestion(suggestion) => self
                .accept_suggestion(editor, config, &suggestion)
                .map(|_| IntentOutcome::SuggestionAccepted),
        }
    }

    /// System prompt for `kind`, rendered with the built-in and user variables.
    fn system_prompt(&self, config: &SynapseConfig, kind: PromptKind) -> String {
        let context = TemplateContext::for_prompts(config, self.clock.today());
        render(config.system_prompts.for_kind(kind), &context)
    }

    async fn generate(
        &self,
        operation: &'static str,
        request: GenerationRequest,
    ) -> Result<String, SynapseError> {
        debug!(
            operation,
            prompt_len = request.prompt.len(),
            has_history = request.history.is_some(),
            "Awaiting generation"
        );
        let response = self.provider.generate(&request).await?;
        debug!(operation, response_len = response.len(), "Generation finished");
        Ok(response)
    }

    /// Report a failure once and hand it back to the caller.
    fn report<T>(&self, operation: &'static str, err: SynapseError) -> Result<T, SynapseError> {
        match &err {
            SynapseError::Input(_) | SynapseError::Conflict(_) => {
                debug!(operation, error = %err, "Operation rejected")
            }
            _ => warn!(operation, error = %err, "Operation failed"),
        }
        let message = match &err {
            SynapseError::Input(message) => message.clone(),
            SynapseError::Conflict(_) => err.to_string(),
            _ => format!("Error: {}", err),
        };
        self.notifier.notify(Notice::error(message));
        Err(err)
    }

    fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }
}
