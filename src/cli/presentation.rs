//! CLI presentation: notices, tables and headings.

use crate::orchestrator::{Notice, NoticeLevel};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str, color: bool) -> String {
    if color {
        format!("{}", title.bold().underline())
    } else {
        title.to_string()
    }
}

/// One line per notice, marked by level.
pub fn format_notices(notices: &[Notice], color: bool) -> String {
    notices
        .iter()
        .map(|notice| {
            let (mark, text) = match notice.level {
                NoticeLevel::Success => ("✓", notice.message.as_str()),
                NoticeLevel::Error => ("✗", notice.message.as_str()),
                NoticeLevel::Info => ("•", notice.message.as_str()),
            };
            if !color {
                return format!("{} {}", mark, text);
            }
            match notice.level {
                NoticeLevel::Success => format!("{} {}", mark.green(), text),
                NoticeLevel::Error => format!("{} {}", mark.red(), text.red()),
                NoticeLevel::Info => format!("{} {}", mark.cyan(), text),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_models_table(models: &[String], current: &str, color: bool) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Models", color));
    if models.is_empty() {
        out.push_str("No models found. Is the generation backend running?\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Model", "Selected"]);
    for model in models {
        let selected = if model == current { "yes" } else { "" };
        table.add_row(vec![model.as_str(), selected]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

pub fn format_templates_table(templates: &[String], color: bool) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Templates", color));
    if templates.is_empty() {
        out.push_str("No template notes found.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["#", "Path"]);
    for (index, path) in templates.iter().enumerate() {
        table.add_row(vec![(index + 1).to_string(), path.clone()]);
    }
    out.push_str(&format!("{}\n", table));
    out
}
