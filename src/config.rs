//! Configuration System
//!
//! One immutable settings record per call. Values are layered from built-in
//! defaults, the user-level config file, the vault's `.synapse/config.toml` and
//! `SYNAPSE__*` environment variables. Updates replace the whole record.

use crate::error::SynapseError;
use crate::logging::LoggingConfig;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "gemma3n:e2b";

/// Where `summarize_note` places the generated summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLocation {
    #[default]
    Top,
    Bottom,
}

/// Operations that carry their own system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    Chat,
    Explanation,
    Summary,
    Flashcard,
    Suggestion,
}

/// System prompt templates, rendered through the template engine before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemPrompts {
    /// Used when an operation's own prompt is empty.
    pub global: String,
    pub chat: String,
    pub explanation: String,
    pub summary: String,
    pub flashcard: String,
    pub suggestion: String,
}

impl Default for SystemPrompts {
    fn default() -> Self {
        Self {
            global: "You are a helpful educational assistant providing concise, accurate information.".to_string(),
            chat: "You are a helpful AI assistant in a chat session. Provide thoughtful, concise responses to the user's questions. Use markdown formatting when appropriate. Reference prior messages in the conversation when relevant.".to_string(),
            explanation: "You are a helpful educational assistant. Create a clear, concise explanation of the given concept. Format your response as a well-structured note with:\n1. A brief definition\n2. Key characteristics or properties\n3. A simple analogy or example if helpful\n4. Why this concept is important\n\nKeep the explanation under {{maxResponseLength}} characters and use clear, educational language.".to_string(),
            summary: "You are a helpful assistant that creates concise summaries. Create a bullet-point summary (3-5 points) of the main ideas in the given text. Each bullet point should be clear and capture a key concept. Format as markdown bullets starting with \"- \".".to_string(),
            flashcard: "You are a helpful assistant that creates study flashcards. From the given text, identify 3-7 key concepts and create flashcards in this exact format:\n\n**Q:** Question here?\n**A:** Answer here\n\nMake questions clear and specific. Answers should be concise but complete. Focus on the most important concepts for learning and retention.".to_string(),
            suggestion: "You are an AI writing assistant. Based on the context provided, suggest a brief continuation (1-3 words maximum). Make your suggestion directly relevant to what's being written. Do not repeat what's already written. Only return the continuation text. Do not include any additional text or formatting.".to_string(),
        }
    }
}

impl SystemPrompts {
    pub fn for_kind(&self, kind: PromptKind) -> &str {
        let prompt = match kind {
            PromptKind::Chat => &self.chat,
            PromptKind::Explanation => &self.explanation,
            PromptKind::Summary => &self.summary,
            PromptKind::Flashcard => &self.flashcard,
            PromptKind::Suggestion => &self.suggestion,
        };
        if prompt.trim().is_empty() {
            &self.global
        } else {
            prompt
        }
    }
}

/// Root settings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynapseConfig {
    /// Base URL of the generation backend (Ollama API)
    pub generation_endpoint: String,
    pub model_name: String,

    pub explanation_folder: String,
    pub flashcard_folder: String,
    pub chat_folder: String,

    pub summary_location: SummaryLocation,
    /// Write summaries into frontmatter instead of a `## Summary` section
    pub use_summary_yaml: bool,

    pub use_template_for_explanations: bool,
    /// Vault-relative path of the note template
    pub template_path: String,
    pub max_response_length: u32,

    pub add_tag: bool,
    /// Comma-separated tags, `#` optional
    pub tag_list: String,

    pub suggestion_delay_ms: u64,
    pub enable_live_suggestions: bool,
    pub show_ghost_text: bool,
    pub allow_quick_accept: bool,

    pub system_prompts: SystemPrompts,

    /// User-defined `{{name}}` variables, stored as a list so names keep their case.
    #[serde(with = "variable_list")]
    pub custom_template_variables: BTreeMap<String, String>,

    pub logging: LoggingConfig,
}

impl Default for SynapseConfig {
    fn default() -> Self {
        Self {
            generation_endpoint: DEFAULT_ENDPOINT.to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            explanation_folder: "Explanations".to_string(),
            flashcard_folder: "Flashcards".to_string(),
            chat_folder: "Chats".to_string(),
            summary_location: SummaryLocation::Top,
            use_summary_yaml: true,
            use_template_for_explanations: false,
            template_path: String::new(),
            max_response_length: 1000,
            add_tag: false,
            tag_list: "synapse".to_string(),
            suggestion_delay_ms: 3000,
            enable_live_suggestions: false,
            show_ghost_text: true,
            allow_quick_accept: true,
            system_prompts: SystemPrompts::default(),
            custom_template_variables: BTreeMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

mod variable_list {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize)]
    struct Variable {
        name: String,
        value: String,
    }

    pub fn serialize<S: Serializer>(
        vars: &BTreeMap<String, String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let list: Vec<Variable> = vars
            .iter()
            .map(|(name, value)| Variable {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, String>, D::Error> {
        let list = Vec::<Variable>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|v| (v.name, v.value)).collect())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl SynapseConfig {
    /// Validate the entire configuration, reporting every problem found.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut fail = |field: &'static str, message: String| {
            errors.push(ValidationError { field, message });
        };

        let endpoint = self.generation_endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            fail(
                "generation_endpoint",
                format!("'{}' must start with http:// or https://", endpoint),
            );
        }
        if self.model_name.trim().is_empty() {
            fail("model_name", "cannot be empty".to_string());
        }
        if self.max_response_length == 0 {
            fail("max_response_length", "must be greater than zero".to_string());
        }
        for (field, folder) in [
            ("explanation_folder", &self.explanation_folder),
            ("flashcard_folder", &self.flashcard_folder),
            ("chat_folder", &self.chat_folder),
        ] {
            if folder.split('/').any(|segment| segment == "..") {
                fail(field, format!("'{}' must stay inside the vault", folder));
            }
        }
        for name in self.custom_template_variables.keys() {
            if name.is_empty() || name.contains("{{") || name.contains("}}") {
                fail(
                    "custom_template_variables",
                    format!("invalid variable name '{}'", name),
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// `#tag` list rendered for note bodies, empty unless tagging is enabled.
    pub fn tags_string(&self) -> String {
        if !self.add_tag {
            return String::new();
        }
        self.tag_list
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(|tag| {
                if tag.starts_with('#') {
                    tag.to_string()
                } else {
                    format!("#{}", tag)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Endpoint without a trailing slash.
    pub fn endpoint(&self) -> &str {
        self.generation_endpoint.trim().trim_end_matches('/')
    }

    /// Render the record as TOML (used by `synapse config init`).
    pub fn to_toml(&self) -> Result<String, SynapseError> {
        toml::to_string_pretty(self)
            .map_err(|e| SynapseError::Config(format!("Failed to serialize config: {}", e)))
    }
}

fn validation_failure(errors: Vec<ValidationError>) -> SynapseError {
    let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    SynapseError::Config(format!(
        "Configuration validation failed:\n{}",
        msgs.join("\n")
    ))
}

/// Holds the current settings and swaps in whole new values on update.
#[derive(Clone)]
pub struct ConfigManager {
    current: Arc<RwLock<Arc<SynapseConfig>>>,
}

impl ConfigManager {
    pub fn new(config: SynapseConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Current settings; the value never changes underneath the caller.
    pub fn snapshot(&self) -> Arc<SynapseConfig> {
        self.current.read().clone()
    }

    /// Replace the settings with a validated new value.
    pub fn replace(&self, config: SynapseConfig) -> Result<Arc<SynapseConfig>, SynapseError> {
        config.validate().map_err(validation_failure)?;
        let next = Arc::new(config);
        *self.current.write() = next.clone();
        Ok(next)
    }

    /// Derive a new value from the current one and install it.
    pub fn update<F>(&self, f: F) -> Result<Arc<SynapseConfig>, SynapseError>
    where
        F: FnOnce(&SynapseConfig) -> SynapseConfig,
    {
        let next = f(&self.snapshot());
        self.replace(next)
    }

    /// Reload from disk for the given vault.
    pub fn reload(&self, vault_root: &Path) -> Result<Arc<SynapseConfig>, SynapseError> {
        let config = ConfigLoader::load(vault_root)?;
        self.replace(config)
    }
}
