//! CLI route: single route table and run context. Opens the note, runs one
//! orchestrator operation against an in-memory buffer and writes it back.

use crate::cli::command_name;
use crate::cli::parse::{ChatCommands, Commands, ConfigCommands};
use crate::cli::presentation::{format_models_table, format_notices, format_templates_table};
use crate::config::{ConfigLoader, ConfigManager, SynapseConfig};
use crate::editor::{BufferEditor, Cursor, Editor};
use crate::error::SynapseError;
use crate::orchestrator::{GenerationOrchestrator, NoticeLog};
use crate::provider::{GenerationProvider, OllamaClient};
use crate::template::TemplateProcessor;
use crate::vault::{normalize_vault_path, FsVault, Vault};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Runtime context for CLI execution: vault, settings and the orchestrator.
pub struct RunContext {
    vault_root: PathBuf,
    vault: Arc<FsVault>,
    config: ConfigManager,
    provider: Arc<dyn GenerationProvider>,
    orchestrator: GenerationOrchestrator,
    notices: Arc<NoticeLog>,
    color: bool,
}

impl RunContext {
    /// Create run context from the vault root and optional config path.
    pub fn new(vault_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, SynapseError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&vault_root)?,
        };
        let provider: Arc<dyn GenerationProvider> = Arc::new(OllamaClient::from_config(&config)?);
        Self::with_provider(vault_root, config, provider)
    }

    /// Context with an explicit provider (used by hosts embedding the CLI routes).
    pub fn with_provider(
        vault_root: PathBuf,
        config: SynapseConfig,
        provider: Arc<dyn GenerationProvider>,
    ) -> Result<Self, SynapseError> {
        let manager = ConfigManager::new(SynapseConfig::default());
        manager.replace(config)?;
        let vault = Arc::new(FsVault::open(&vault_root)?);
        let notices = Arc::new(NoticeLog::new());
        let orchestrator =
            GenerationOrchestrator::new(provider.clone(), vault.clone(), notices.clone());
        let color = std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal();
        Ok(Self {
            vault_root,
            vault,
            config: manager,
            provider,
            orchestrator,
            notices,
            color,
        })
    }

    pub fn config(&self) -> Arc<SynapseConfig> {
        self.config.snapshot()
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, SynapseError> {
        let started = Instant::now();
        let name = command_name(command);
        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| SynapseError::Config(format!("Failed to create runtime: {}", e)))?;
        let result = rt.block_on(self.execute_inner(command));
        info!(
            command = %name,
            ok = result.is_ok(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Command finished"
        );

        let notices = self.notices.take();
        let output = result?;
        let mut rendered = format_notices(&notices, self.color);
        if !output.is_empty() {
            if !rendered.is_empty() {
                rendered.push('\n');
            }
            rendered.push_str(&output);
        }
        Ok(rendered)
    }

    async fn execute_inner(&self, command: &Commands) -> Result<String, SynapseError> {
        let config = self.config.snapshot();
        match command {
            Commands::Explain { note, selection } => {
                let editor = self.open_note(note, Some(selection), None)?;
                let artifact = self.orchestrator.explain_and_link(&editor, &config).await?;
                self.save_note(note, &editor)?;
                Ok(format!("Wrote {}", artifact.path))
            }
            Commands::Summarize { note } => {
                let editor = self.open_note(note, None, None)?;
                self.orchestrator.summarize_note(&editor, &config).await?;
                self.save_note(note, &editor)?;
                Ok(String::new())
            }
            Commands::Flashcards { note, selection } => {
                let editor = self.open_note(note, Some(selection), None)?;
                let outcome = self.orchestrator.create_flashcards(&editor, &config).await?;
                self.save_note(note, &editor)?;
                Ok(format!("Wrote {}", outcome.path))
            }
            Commands::Chat { command } => self.handle_chat_command(command, &config).await,
            Commands::Suggest { note, line, accept } => {
                let editor = self.open_note(note, None, Some(*line))?;
                // An explicit request is not gated by the live-suggestion toggle.
                let config = SynapseConfig {
                    enable_live_suggestions: true,
                    ..(*config).clone()
                };
                let suggestion = self
                    .orchestrator
                    .generate_live_suggestion(&editor, &config)
                    .await?;
                let Some(suggestion) = suggestion else {
                    return Ok("No suggestion.".to_string());
                };
                if *accept {
                    self.orchestrator
                        .accept_suggestion(&editor, &config, &suggestion)?;
                    self.save_note(note, &editor)?;
                    Ok(format!("Inserted: {}", suggestion.text))
                } else {
                    Ok(suggestion.text)
                }
            }
            Commands::Models => {
                let models = self.provider.list_models().await;
                Ok(format_models_table(&models, &config.model_name, self.color))
            }
            Commands::Health => {
                let available = self.orchestrator.check_health(&config).await;
                if available {
                    Ok(String::new())
                } else {
                    Err(SynapseError::transport(
                        None,
                        format!("{} is unreachable", config.endpoint()),
                    ))
                }
            }
            Commands::Templates => {
                let templates = TemplateProcessor::new(self.vault.as_ref()).list_templates()?;
                Ok(format_templates_table(&templates, self.color))
            }
            Commands::Config { command } => self.handle_config_command(command, &config),
        }
    }

    async fn handle_chat_command(
        &self,
        command: &ChatCommands,
        config: &SynapseConfig,
    ) -> Result<String, SynapseError> {
        match command {
            ChatCommands::New => {
                let session = self.orchestrator.start_chat_session(config)?;
                Ok(format!(
                    "Wrote {} (prompt on line {})",
                    session.path, session.cursor.line
                ))
            }
            ChatCommands::Send { note, line } => {
                let editor = self.open_note(note, None, *line)?;
                let committed = self.orchestrator.send_chat_message(&editor, config).await;
                // The error turn is part of the document too.
                self.save_note(note, &editor)?;
                let committed = committed?;
                Ok(format!("Next prompt on line {}", committed.cursor.line))
            }
        }
    }

    fn handle_config_command(
        &self,
        command: &ConfigCommands,
        config: &SynapseConfig,
    ) -> Result<String, SynapseError> {
        match command {
            ConfigCommands::Init { force } => {
                let path = ConfigLoader::vault_config_path(&self.vault_root);
                if path.exists() && !force {
                    return Err(SynapseError::Conflict(path.display().to_string()));
                }
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, SynapseConfig::default().to_toml()?)?;
                Ok(format!("Wrote {}", path.display()))
            }
            ConfigCommands::Show => config.to_toml(),
        }
    }

    /// Load a note into a buffer, mark it active, and place selection/cursor.
    fn open_note(
        &self,
        note: &str,
        selection: Option<&String>,
        line: Option<usize>,
    ) -> Result<BufferEditor, SynapseError> {
        let path = normalize_vault_path(note);
        let text = self.vault.read(&path)?;
        let editor = BufferEditor::new(text);

        if let Some(selection) = selection {
            if !editor.select_text(selection) {
                return Err(SynapseError::Input(format!(
                    "Selection not found in {}: {}",
                    path, selection
                )));
            }
        }
        let last = editor.line_count().saturating_sub(1);
        let cursor_line = line.unwrap_or(last).min(last);
        if selection.is_none() {
            let ch = editor
                .line(cursor_line)
                .map(|l| l.chars().count())
                .unwrap_or(0);
            editor.set_cursor(Cursor::new(cursor_line, ch));
        }
        self.vault.set_active(&path, editor.cursor());
        debug!(note = %path, cursor = ?editor.cursor(), "Opened note");
        Ok(editor)
    }

    fn save_note(&self, note: &str, editor: &BufferEditor) -> Result<(), SynapseError> {
        let path = normalize_vault_path(note);
        let text = editor.value();
        if self.vault.read(&path).ok().as_deref() != Some(text.as_str()) {
            self.vault.modify(&path, &text)?;
        }
        Ok(())
    }
}
