//! Chat transcript model
//!
//! A chat lives inside an ordinary note under a `## Chat` heading. User turns
//! are lines starting with `> `; everything non-blank after a user turn, up to
//! the next one, is the assistant's reply. Positions are always derived from
//! the current text, never carried across a generation call.

use crate::editor::Cursor;
use crate::error::SynapseError;
use std::fmt;
use tracing::debug;

pub const CHAT_HEADING: &str = "## Chat";
pub const USER_PREFIX: &str = "> ";
pub const PLACEHOLDER: &str = "_Synapse is thinking..._";
pub const ERROR_TURN: &str = "_Error: Could not generate response_";

/// Lines starting with this marker are transient UI lines, never history.
const MARKER: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// Index of the turn's first line.
    pub line: usize,
}

/// A bare `>` counts as an empty prompt; editors often strip the trailing space.
pub fn is_user_line(line: &str) -> bool {
    line.starts_with(USER_PREFIX) || line == ">"
}

fn is_marker_line(line: &str) -> bool {
    line.starts_with(MARKER)
}

/// Text of a user line with the prompt marker removed.
pub fn user_text(line: &str) -> &str {
    line.strip_prefix(USER_PREFIX)
        .or_else(|| line.strip_prefix('>'))
        .unwrap_or(line)
        .trim()
}

fn chat_start(lines: &[&str]) -> Option<usize> {
    lines.iter().position(|line| *line == CHAT_HEADING)
}

/// Ordered turns of a document's chat section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    pub heading: Option<usize>,
    pub turns: Vec<Turn>,
}

impl Transcript {
    /// Parse the chat section of `doc`. Documents without `## Chat` yield an
    /// empty transcript.
    pub fn parse(doc: &str) -> Self {
        let lines: Vec<&str> = doc.split('\n').collect();
        let Some(heading) = chat_start(&lines) else {
            return Self::default();
        };

        let mut turns: Vec<Turn> = Vec::new();
        for (index, line) in lines.iter().enumerate().skip(heading + 1) {
            if is_user_line(line) {
                turns.push(Turn {
                    role: Role::User,
                    text: user_text(line).to_string(),
                    line: index,
                });
                continue;
            }
            if line.trim().is_empty() || is_marker_line(line) {
                continue;
            }
            match turns.last_mut() {
                Some(turn) if turn.role == Role::Assistant => {
                    turn.text.push('\n');
                    turn.text.push_str(line);
                }
                Some(_) => turns.push(Turn {
                    role: Role::Assistant,
                    text: line.to_string(),
                    line: index,
                }),
                // Text before the first prompt is not part of any exchange.
                None => {}
            }
        }

        Self {
            heading: Some(heading),
            turns,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The unanswered user turn nearest at or above `cursor_line`.
    pub fn active_turn(&self, cursor_line: usize) -> Option<&Turn> {
        let position = self
            .turns
            .iter()
            .rposition(|turn| turn.role == Role::User && turn.line <= cursor_line)?;
        match self.turns.get(position + 1) {
            Some(next) if next.role == Role::Assistant => None,
            _ => Some(&self.turns[position]),
        }
    }
}

/// Scan upward from `cursor_line` (inclusive) for a user prompt line.
pub fn locate_active_prompt(lines: &[&str], cursor_line: usize) -> Option<usize> {
    if lines.is_empty() {
        return None;
    }
    let start = cursor_line.min(lines.len() - 1);
    (0..=start).rev().find(|&i| is_user_line(lines[i]))
}

/// Whether the prompt at `index` still has no reply below it.
pub fn is_awaiting_reply(lines: &[&str], index: usize) -> bool {
    match lines
        .iter()
        .skip(index + 1)
        .find(|line| !line.trim().is_empty())
    {
        None => true,
        Some(line) => is_user_line(line) || *line == PLACEHOLDER,
    }
}

/// Prior turns as `User: ..` / `AI: ..` lines, oldest first, each newline-terminated.
pub fn extract_history(lines: &[&str], active_index: usize) -> String {
    let end = active_index.min(lines.len());
    let Some(heading) = chat_start(&lines[..end]) else {
        return String::new();
    };

    let mut history = String::new();
    for line in &lines[heading + 1..end] {
        if is_user_line(line) {
            history.push_str("User: ");
            history.push_str(user_text(line));
            history.push('\n');
        } else if !line.trim().is_empty() && !is_marker_line(line) {
            history.push_str("AI: ");
            history.push_str(line);
            history.push('\n');
        }
    }
    history
}

fn split_lines(doc: &str) -> Vec<String> {
    doc.split('\n').map(str::to_string).collect()
}

/// Insert the thinking placeholder (after a blank line) directly below `prompt_index`.
pub fn insert_placeholder(doc: &str, prompt_index: usize) -> String {
    let mut lines = split_lines(doc);
    let at = (prompt_index + 1).min(lines.len());
    lines.splice(at..at, [String::new(), PLACEHOLDER.to_string()]);
    lines.join("\n")
}

/// Find the placeholder that belongs to the prompt `> message` by content.
pub fn find_placeholder(lines: &[&str], message: &str) -> Option<usize> {
    lines.iter().enumerate().find_map(|(index, line)| {
        if *line != PLACEHOLDER {
            return None;
        }
        let owner = lines[..index]
            .iter()
            .rev()
            .find(|line| !line.trim().is_empty())?;
        (is_user_line(owner) && user_text(owner) == message).then_some(index)
    })
}

/// Where a replacement block lands once the placeholder has been re-located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// Replace lines `[start, end)` (the placeholder and its leading blank).
    Placeholder { start: usize, end: usize },
    /// Placeholder gone; insert right after the prompt line.
    AfterPrompt(usize),
    EndOfDocument,
}

/// Placeholder for `message`, tolerating edits made while generation was pending.
///
/// Owner match first; then the nearest placeholder below the prompt (lines were
/// typed in between); then, when the prompt text itself changed, the last
/// placeholder left in the document.
fn locate_placeholder(lines: &[&str], message: &str, prompt: Option<usize>) -> Option<usize> {
    if let Some(index) = find_placeholder(lines, message) {
        return Some(index);
    }
    match prompt {
        Some(prompt) => (prompt + 1..lines.len()).find(|&i| lines[i] == PLACEHOLDER),
        None => lines.iter().rposition(|line| *line == PLACEHOLDER),
    }
}

fn locate_anchor(lines: &[&str], message: &str) -> Anchor {
    let prompt = lines
        .iter()
        .rposition(|line| is_user_line(line) && user_text(line) == message);
    if let Some(index) = locate_placeholder(lines, message, prompt) {
        let start = if index > 0 && lines[index - 1].trim().is_empty() {
            index - 1
        } else {
            index
        };
        return Anchor::Placeholder {
            start,
            end: index + 1,
        };
    }
    match prompt {
        Some(prompt) => Anchor::AfterPrompt(prompt),
        None => Anchor::EndOfDocument,
    }
}

/// Replace this prompt's placeholder with `block`, re-locating it in `doc`.
/// Returns the new text and the index of the block's first line.
pub fn replace_placeholder(doc: &str, message: &str, block: &[String]) -> (String, usize) {
    let anchor = {
        let lines: Vec<&str> = doc.split('\n').collect();
        locate_anchor(&lines, message)
    };
    let mut lines = split_lines(doc);
    let (range, at) = match anchor {
        Anchor::Placeholder { start, end } => (start..end, start),
        Anchor::AfterPrompt(prompt) => (prompt + 1..prompt + 1, prompt + 1),
        Anchor::EndOfDocument => (lines.len()..lines.len(), lines.len()),
    };
    debug!(?anchor, block_lines = block.len(), "Replacing chat placeholder");
    lines.splice(range, block.iter().cloned());
    (lines.join("\n"), at)
}

/// Assistant reply followed by a fresh empty prompt.
pub fn render_reply(response: &str) -> Vec<String> {
    let mut block = vec![String::new()];
    block.extend(response.split('\n').map(str::to_string));
    block.push(String::new());
    block.push(USER_PREFIX.to_string());
    block
}

pub fn render_error() -> Vec<String> {
    vec![String::new(), ERROR_TURN.to_string()]
}

/// Append a user turn at the end of the document.
pub fn append_turn(doc: &str, message: &str) -> String {
    let mut text = doc.trim_end_matches('\n').to_string();
    if !text.is_empty() {
        text.push_str("\n\n");
    }
    text.push_str(USER_PREFIX);
    text.push_str(message);
    text
}

/// Phases of one chat exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    PromptCaptured,
    Generating,
    Committed,
    Failed,
}

impl fmt::Display for ChatPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChatPhase::Idle => "idle",
            ChatPhase::PromptCaptured => "prompt-captured",
            ChatPhase::Generating => "generating",
            ChatPhase::Committed => "committed",
            ChatPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Document text after a commit plus where the cursor goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedText {
    pub text: String,
    pub cursor: Cursor,
}

/// One prompt/reply exchange driven through [`ChatPhase`].
#[derive(Debug, Clone)]
pub struct ChatExchange {
    phase: ChatPhase,
    message: String,
    history: String,
}

impl Default for ChatExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatExchange {
    pub fn new() -> Self {
        Self {
            phase: ChatPhase::Idle,
            message: String::new(),
            history: String::new(),
        }
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn history(&self) -> &str {
        &self.history
    }

    fn expect(&self, phase: ChatPhase) -> Result<(), SynapseError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(SynapseError::Parse(format!(
                "chat exchange is {}, expected {}",
                self.phase, phase
            )))
        }
    }

    fn advance(&mut self, next: ChatPhase) {
        debug!(from = %self.phase, to = %next, "Chat exchange transition");
        self.phase = next;
    }

    /// Idle → PromptCaptured. Finds the prompt at or above the cursor and
    /// captures its message and the history before it.
    pub fn capture(&mut self, doc: &str, cursor_line: usize) -> Result<usize, SynapseError> {
        self.expect(ChatPhase::Idle)?;
        let lines: Vec<&str> = doc.split('\n').collect();
        let index = locate_active_prompt(&lines, cursor_line).ok_or_else(|| {
            SynapseError::Input("No chat prompt found. Please start message with >".to_string())
        })?;
        let message = user_text(lines[index]);
        if message.is_empty() {
            return Err(SynapseError::Input("Please type a message first".to_string()));
        }
        if !is_awaiting_reply(&lines, index) {
            debug!(line = index, "Prompt already answered; sending it again");
        }
        self.message = message.to_string();
        self.history = extract_history(&lines, index);
        self.advance(ChatPhase::PromptCaptured);
        Ok(index)
    }

    /// PromptCaptured → Generating. Normalizes the prompt line and inserts the
    /// placeholder below it, re-locating the prompt in `doc`.
    pub fn begin(&mut self, doc: &str, cursor_line: usize) -> Result<String, SynapseError> {
        self.expect(ChatPhase::PromptCaptured)?;
        let lines: Vec<&str> = doc.split('\n').collect();
        let index = locate_active_prompt(&lines, cursor_line)
            .filter(|&i| user_text(lines[i]) == self.message)
            .or_else(|| {
                lines
                    .iter()
                    .rposition(|line| is_user_line(line) && user_text(line) == self.message)
            })
            .ok_or_else(|| {
                SynapseError::Parse(format!("prompt \"{}\" no longer in document", self.message))
            })?;

        let mut owned = split_lines(doc);
        owned[index] = format!("{}{}", USER_PREFIX, self.message);
        let text = insert_placeholder(&owned.join("\n"), index);
        self.advance(ChatPhase::Generating);
        Ok(text)
    }

    /// Generating → Committed. Swaps the placeholder for the reply and a fresh prompt.
    pub fn commit(&mut self, doc: &str, response: &str) -> Result<CommittedText, SynapseError> {
        self.expect(ChatPhase::Generating)?;
        let block = render_reply(response);
        let (text, at) = replace_placeholder(doc, &self.message, &block);
        let prompt_line = at + block.len() - 1;
        self.advance(ChatPhase::Committed);
        Ok(CommittedText {
            text,
            cursor: Cursor::new(prompt_line, USER_PREFIX.len()),
        })
    }

    /// Generating → Failed. Swaps the placeholder for the inline error turn.
    pub fn fail(&mut self, doc: &str) -> Result<String, SynapseError> {
        self.expect(ChatPhase::Generating)?;
        let (text, _) = replace_placeholder(doc, &self.message, &render_error());
        self.advance(ChatPhase::Failed);
        Ok(text)
    }

    /// Committed | Failed → Idle.
    pub fn finish(&mut self) {
        if matches!(self.phase, ChatPhase::Committed | ChatPhase::Failed) {
            self.advance(ChatPhase::Idle);
            self.message.clear();
            self.history.clear();
        }
    }
}

/// Body of a fresh chat session note; the cursor belongs on the returned prompt line.
pub fn session_note(started: &str, tags: &str) -> (String, Cursor) {
    let tags_line = if tags.is_empty() {
        String::new()
    } else {
        format!("\ntags: {}", tags)
    };
    let text = format!(
        "# Chat Session {}{}\n\n## Context\n*This is a chat session with Synapse AI. Type your messages after the > prompt.*\n\n{}\n\n{}\n\n",
        started, tags_line, CHAT_HEADING, USER_PREFIX
    );
    let line = text
        .split('\n')
        .position(|line| line == USER_PREFIX)
        .unwrap_or(0);
    (text, Cursor::new(line, USER_PREFIX.len()))
}
