//! Frontmatter detection and merge.
//!
//! A document has frontmatter when line 0 is exactly `---` and a later line is
//! exactly `---`. Merging is a textual splice: existing keys keep their exact
//! text and only the new key block is written.

use crate::error::SynapseError;
use tracing::debug;

pub const DELIMITER: &str = "---";

const BLOCK_INDENT: &str = "  ";

/// Value written under a frontmatter key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontmatterValue {
    /// Rendered as `key: value` on one line.
    Scalar(String),
    /// Rendered as `key:` followed by every line indented two spaces.
    Block(String),
}

/// One top-level key with the raw lines it occupies (continuations included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontmatterEntry {
    pub key: String,
    /// Document line index of the `key:` line.
    pub start: usize,
    /// Exclusive end line index.
    pub end: usize,
    pub raw: Vec<String>,
}

impl FrontmatterEntry {
    pub fn value(&self) -> FrontmatterValue {
        let first = &self.raw[0];
        let inline = first
            .split_once(':')
            .map(|(_, rest)| rest.trim())
            .unwrap_or_default();
        if !inline.is_empty() {
            return FrontmatterValue::Scalar(inline.to_string());
        }
        let block: Vec<&str> = self.raw[1..]
            .iter()
            .map(|line| line.strip_prefix(BLOCK_INDENT).unwrap_or(line.trim_start()))
            .collect();
        FrontmatterValue::Block(block.join("\n"))
    }
}

/// Parsed view of a well-formed frontmatter block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter {
    /// Index of the closing `---` line.
    pub close_index: usize,
    /// Lines between the opening delimiter and the first key (comments, blanks).
    pub preamble: Vec<String>,
    pub entries: Vec<FrontmatterEntry>,
}

impl Frontmatter {
    /// Parse the leading block of `doc`, `None` when absent or unterminated.
    pub fn parse(doc: &str) -> Option<Self> {
        let lines: Vec<&str> = doc.split('\n').collect();
        Self::parse_lines(&lines)
    }

    pub fn parse_lines(lines: &[&str]) -> Option<Self> {
        let close_index = close_index(lines)?;
        let mut preamble = Vec::new();
        let mut entries: Vec<FrontmatterEntry> = Vec::new();

        for (index, line) in lines.iter().enumerate().take(close_index).skip(1) {
            match top_level_key(line) {
                Some(key) => {
                    if let Some(prev) = entries.last_mut() {
                        prev.end = index;
                    }
                    entries.push(FrontmatterEntry {
                        key: key.to_string(),
                        start: index,
                        end: index + 1,
                        raw: vec![line.to_string()],
                    });
                }
                None => match entries.last_mut() {
                    Some(entry) => {
                        entry.raw.push(line.to_string());
                        entry.end = index + 1;
                    }
                    None => preamble.push(line.to_string()),
                },
            }
        }
        if let Some(last) = entries.last_mut() {
            last.end = close_index;
        }

        Some(Self {
            close_index,
            preamble,
            entries,
        })
    }

    pub fn get(&self, key: &str) -> Option<&FrontmatterEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }
}

/// Index of the closing delimiter, if the document opens with a terminated block.
pub fn close_index(lines: &[&str]) -> Option<usize> {
    if lines.first().copied() != Some(DELIMITER) {
        return None;
    }
    lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| **line == DELIMITER)
        .map(|(index, _)| index)
}

pub fn has_frontmatter(doc: &str) -> bool {
    let lines: Vec<&str> = doc.split('\n').collect();
    close_index(&lines).is_some()
}

/// True when line 0 opens a block that never closes.
pub fn is_unterminated(doc: &str) -> bool {
    doc.split('\n').next() == Some(DELIMITER) && !has_frontmatter(doc)
}

fn top_level_key(line: &str) -> Option<&str> {
    if line.is_empty() || line.starts_with(char::is_whitespace) {
        return None;
    }
    if line.starts_with('#') || line.starts_with('-') {
        return None;
    }
    let (key, _) = line.split_once(':')?;
    let key = key.trim();
    (!key.is_empty()).then_some(key)
}

fn render_entry(key: &str, value: &FrontmatterValue) -> Vec<String> {
    match value {
        FrontmatterValue::Scalar(v) => vec![format!("{}: {}", key, v)],
        FrontmatterValue::Block(text) => {
            let mut lines = vec![format!("{}:", key)];
            lines.extend(text.split('\n').map(|line| {
                if line.is_empty() {
                    String::new()
                } else {
                    format!("{}{}", BLOCK_INDENT, line)
                }
            }));
            lines
        }
    }
}

/// Merge `key` as a block value into the document's frontmatter.
pub fn merge(doc: &str, key: &str, block_value: &str) -> Result<String, SynapseError> {
    merge_value(doc, key, &FrontmatterValue::Block(block_value.to_string()))
}

/// Splice `key` into the frontmatter just before the closing delimiter.
///
/// Existing lines are never rewritten: fails with `Parse` when the document
/// has no terminated frontmatter block or already carries `key`. Callers fall
/// back to adding a section instead.
pub fn merge_value(
    doc: &str,
    key: &str,
    value: &FrontmatterValue,
) -> Result<String, SynapseError> {
    let lines: Vec<&str> = doc.split('\n').collect();
    let fm = Frontmatter::parse_lines(&lines).ok_or_else(|| {
        if is_unterminated(doc) {
            SynapseError::Parse("frontmatter has no closing delimiter".to_string())
        } else {
            SynapseError::Parse("document has no frontmatter".to_string())
        }
    })?;

    let block = render_entry(key, value);
    let mut head: Vec<String> = Vec::with_capacity(fm.close_index + block.len());

    if fm.get(key).is_some() {
        return Err(SynapseError::Parse(format!(
            "frontmatter already has a \"{}\" key",
            key
        )));
    }
    debug!(key, close_index = fm.close_index, "Appending frontmatter key");
    head.extend(lines[..fm.close_index].iter().map(|l| l.to_string()));
    head.extend(block);
    head.push(DELIMITER.to_string());

    let body = &lines[fm.close_index + 1..];
    if body.first().map_or(true, |line| !line.trim().is_empty()) {
        head.push(String::new());
    }
    head.extend(body.iter().map(|l| l.to_string()));

    Ok(head.join("\n"))
}
