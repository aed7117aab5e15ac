//! Note summaries and where they land in the document.

use super::{GenerationOrchestrator, Notice};
use crate::config::{PromptKind, SummaryLocation, SynapseConfig};
use crate::editor::Editor;
use crate::error::SynapseError;
use crate::frontmatter::{self, Frontmatter};
use crate::provider::GenerationRequest;
use tracing::{debug, warn};

pub const SUMMARY_KEY: &str = "summary";

/// Where a summary was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryPlacement {
    /// Merged into the frontmatter under `summary:`.
    Frontmatter,
    /// `## Summary` section after the frontmatter, or at line 0.
    Top,
    /// `## Summary` section at the end of the document.
    Bottom,
}

/// `## Summary` section text.
pub fn summary_section(summary: &str) -> String {
    format!("## Summary\n\n{}\n\n---\n", summary)
}

fn insert_section(doc: &str, index: usize, section: &str) -> String {
    let lines: Vec<&str> = doc.split('\n').collect();
    let index = index.min(lines.len());
    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + 8);
    out.extend_from_slice(&lines[..index]);
    if index > 0 {
        out.push("");
    }
    out.extend(section.trim_end_matches('\n').split('\n'));
    out.push("");
    out.extend_from_slice(&lines[index..]);
    out.join("\n")
}

/// Place `summary` into `doc` according to the configured location and format.
///
/// Top placement merges into well-formed frontmatter when YAML mode is on.
/// Otherwise a `## Summary` section goes after a well-formed block, or at
/// line 0 when frontmatter is missing or has no closing delimiter.
pub fn place_summary(
    doc: &str,
    summary: &str,
    location: SummaryLocation,
    use_yaml: bool,
) -> (String, SummaryPlacement) {
    match location {
        SummaryLocation::Bottom => {
            let body = doc.trim_end_matches('\n');
            (
                format!("{}\n\n{}", body, summary_section(summary)),
                SummaryPlacement::Bottom,
            )
        }
        SummaryLocation::Top => {
            let section = summary_section(summary);
            let Some(fm) = Frontmatter::parse(doc) else {
                if frontmatter::is_unterminated(doc) {
                    debug!("Frontmatter has no closing delimiter; summary goes to line 0");
                }
                return (insert_section(doc, 0, &section), SummaryPlacement::Top);
            };
            if use_yaml {
                match frontmatter::merge(doc, SUMMARY_KEY, summary) {
                    Ok(merged) => return (merged, SummaryPlacement::Frontmatter),
                    Err(e) => warn!(error = %e, "Frontmatter merge failed; adding a section"),
                }
            }
            (
                insert_section(doc, fm.close_index + 1, &section),
                SummaryPlacement::Top,
            )
        }
    }
}

impl GenerationOrchestrator {
    /// Summarize the whole document and place the summary per the settings.
    pub async fn summarize_note(
        &self,
        editor: &dyn Editor,
        config: &SynapseConfig,
    ) -> Result<SummaryPlacement, SynapseError> {
        let content = editor.value();
        if content.trim().is_empty() {
            return self.report(
                "summarize_note",
                SynapseError::Input("No content to summarize".to_string()),
            );
        }

        let request = GenerationRequest::new(
            format!("Summarize this content:\n\n{}", content),
            self.system_prompt(config, PromptKind::Summary),
        );
        let summary = match self.generate("summarize_note", request).await {
            Ok(summary) => summary,
            Err(e) => return self.report("summarize_note", e),
        };

        // Re-read: the document may have changed while generation was pending.
        let current = editor.value();
        let (text, placement) = place_summary(
            &current,
            &summary,
            config.summary_location,
            config.use_summary_yaml,
        );
        editor.set_value(&text);
        debug!(?placement, "Summary placed");

        let message = match placement {
            SummaryPlacement::Frontmatter => "Summary added to frontmatter",
            _ => "Summary added to note",
        };
        self.notify(Notice::success(message));
        Ok(placement)
    }
}
