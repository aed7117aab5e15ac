//! CLI domain: parse, route, help, output, and presentation only.
//! Operations themselves live in the orchestrator; the route table opens the
//! note, runs one operation and writes the buffer back.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::{exit_code, map_error};
pub use parse::{ChatCommands, Cli, Commands, ConfigCommands};
pub use presentation::{
    format_models_table, format_notices, format_section_heading, format_templates_table,
};
pub use route::RunContext;
