//! Editor collaborator: the host's open-document buffer.
//!
//! The core only reads and replaces text through this trait. `BufferEditor` is
//! the in-process implementation used by the CLI host and the tests.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Zero-based line / column position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cursor {
    pub line: usize,
    pub ch: usize,
}

impl Cursor {
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }
}

pub trait Editor: Send + Sync {
    fn selection(&self) -> String;
    fn value(&self) -> String;
    fn set_value(&self, text: &str);
    fn cursor(&self) -> Cursor;
    fn set_cursor(&self, cursor: Cursor);
    fn replace_selection(&self, text: &str);
    /// Insert `text` at `at`.
    fn replace_range(&self, text: &str, at: Cursor);
    fn line(&self, n: usize) -> Option<String>;
    fn set_line(&self, n: usize, text: &str);

    fn line_count(&self) -> usize {
        self.value().split('\n').count()
    }
}

#[derive(Debug, Default)]
struct BufferState {
    text: String,
    cursor: Cursor,
    /// Byte range of the selection, if any.
    selection: Option<(usize, usize)>,
}

/// In-memory text buffer implementing [`Editor`].
#[derive(Debug, Default)]
pub struct BufferEditor {
    state: Mutex<BufferState>,
}

impl BufferEditor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(BufferState {
                text: text.into(),
                ..Default::default()
            }),
        }
    }

    /// Select the first occurrence of `needle`; returns false when absent.
    pub fn select_text(&self, needle: &str) -> bool {
        let mut state = self.state.lock();
        match state.text.find(needle) {
            Some(start) if !needle.is_empty() => {
                state.selection = Some((start, start + needle.len()));
                state.cursor = offset_to_cursor(&state.text, start + needle.len());
                true
            }
            _ => false,
        }
    }

    pub fn clear_selection(&self) {
        self.state.lock().selection = None;
    }
}

fn offset_to_cursor(text: &str, offset: usize) -> Cursor {
    let before = &text[..offset.min(text.len())];
    let line = before.matches('\n').count();
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    Cursor::new(line, before[line_start..].chars().count())
}

fn cursor_to_offset(text: &str, cursor: Cursor) -> usize {
    let mut offset = 0;
    for (index, line) in text.split('\n').enumerate() {
        if index == cursor.line {
            let col = line
                .char_indices()
                .nth(cursor.ch)
                .map(|(i, _)| i)
                .unwrap_or(line.len());
            return offset + col;
        }
        offset += line.len() + 1;
    }
    text.len()
}

impl Editor for BufferEditor {
    fn selection(&self) -> String {
        let state = self.state.lock();
        state
            .selection
            .map(|(start, end)| state.text[start..end].to_string())
            .unwrap_or_default()
    }

    fn value(&self) -> String {
        self.state.lock().text.clone()
    }

    fn set_value(&self, text: &str) {
        let mut state = self.state.lock();
        state.text = text.to_string();
        state.selection = None;
        let last_line = state.text.split('\n').count() - 1;
        if state.cursor.line > last_line {
            state.cursor = Cursor::new(last_line, 0);
        }
    }

    fn cursor(&self) -> Cursor {
        self.state.lock().cursor
    }

    fn set_cursor(&self, cursor: Cursor) {
        self.state.lock().cursor = cursor;
    }

    fn replace_selection(&self, text: &str) {
        let mut state = self.state.lock();
        let (start, end) = match state.selection.take() {
            Some(range) => range,
            None => {
                let at = cursor_to_offset(&state.text, state.cursor);
                (at, at)
            }
        };
        state.text.replace_range(start..end, text);
        state.cursor = offset_to_cursor(&state.text, start + text.len());
    }

    fn replace_range(&self, text: &str, at: Cursor) {
        let mut state = self.state.lock();
        let offset = cursor_to_offset(&state.text, at);
        state.text.insert_str(offset, text);
        state.selection = None;
    }

    fn line(&self, n: usize) -> Option<String> {
        self.state.lock().text.split('\n').nth(n).map(str::to_string)
    }

    fn set_line(&self, n: usize, text: &str) {
        let mut state = self.state.lock();
        let mut lines: Vec<String> = state.text.split('\n').map(str::to_string).collect();
        if let Some(line) = lines.get_mut(n) {
            *line = text.to_string();
            state.text = lines.join("\n");
            state.selection = None;
        }
    }
}
