//! CLI command-name contract for logging and routing.

use crate::cli::parse::{ChatCommands, Commands, ConfigCommands};

/// Command name string for log events (e.g. "chat.send", "config.init").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Explain { .. } => "explain".to_string(),
        Commands::Summarize { .. } => "summarize".to_string(),
        Commands::Flashcards { .. } => "flashcards".to_string(),
        Commands::Chat { command } => format!("chat.{}", chat_command_name(command)),
        Commands::Suggest { .. } => "suggest".to_string(),
        Commands::Models => "models".to_string(),
        Commands::Health => "health".to_string(),
        Commands::Templates => "templates".to_string(),
        Commands::Config { command } => format!("config.{}", config_command_name(command)),
    }
}

pub fn chat_command_name(command: &ChatCommands) -> &'static str {
    match command {
        ChatCommands::New => "new",
        ChatCommands::Send { .. } => "send",
    }
}

pub fn config_command_name(command: &ConfigCommands) -> &'static str {
    match command {
        ConfigCommands::Init { .. } => "init",
        ConfigCommands::Show => "show",
    }
}
