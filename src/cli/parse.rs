//! CLI parse: clap types for Synapse. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Synapse CLI - AI explanations, summaries, flashcards and chat for markdown notes
#[derive(Parser)]
#[command(name = "synapse")]
#[command(about = "AI-generated explanations, summaries, flashcards and inline chat for markdown notes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault root directory
    #[arg(long, default_value = ".")]
    pub vault: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Explain the selected text in a new note and link it
    Explain {
        /// Vault-relative path of the note
        note: String,
        /// Text to explain (first occurrence in the note is selected)
        #[arg(long)]
        selection: String,
    },
    /// Summarize a note in place
    Summarize {
        /// Vault-relative path of the note
        note: String,
    },
    /// Create flashcards from the selected text
    Flashcards {
        /// Vault-relative path of the note
        note: String,
        /// Text to create flashcards from
        #[arg(long)]
        selection: String,
    },
    /// Chat sessions
    Chat {
        #[command(subcommand)]
        command: ChatCommands,
    },
    /// Suggest a continuation at the end of a line
    Suggest {
        /// Vault-relative path of the note
        note: String,
        /// Zero-based line the cursor sits on
        #[arg(long)]
        line: usize,
        /// Insert the suggestion into the note
        #[arg(long)]
        accept: bool,
    },
    /// List models available on the generation backend
    Models,
    /// Check that the generation backend is reachable
    Health,
    /// List template notes in the vault
    Templates,
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ChatCommands {
    /// Create a new chat session note
    New,
    /// Answer the prompt at or above a line
    Send {
        /// Vault-relative path of the chat note
        note: String,
        /// Zero-based cursor line (default: last line)
        #[arg(long)]
        line: Option<usize>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration to <vault>/.synapse/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
}
