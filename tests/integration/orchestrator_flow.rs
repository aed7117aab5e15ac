//! End-to-end orchestrator flows over an in-memory vault and buffer.

use crate::integration::test_utils::{fixture, ScriptedProvider};
use std::sync::Arc;
use synapse::chat::{ERROR_TURN, PLACEHOLDER};
use synapse::config::{SummaryLocation, SynapseConfig};
use synapse::editor::{BufferEditor, Cursor, Editor};
use synapse::orchestrator::{IntentOutcome, NoticeLevel, SummaryPlacement, UserIntent};
use synapse::vault::Vault;
use synapse::SynapseError;

const SOURCE: &str = "Physics/Thermo.md";

fn open(fx: &crate::integration::test_utils::Fixture, text: &str) -> Arc<BufferEditor> {
    fx.vault.insert(SOURCE, text);
    let editor = Arc::new(BufferEditor::new(text));
    fx.vault.set_active(SOURCE, editor.cursor());
    editor
}

#[tokio::test]
async fn test_explain_creates_note_links_selection_and_rejects_duplicate() {
    let fx = fixture(ScriptedProvider::replying(&["  Entropy is a measure of disorder.  "]));
    let editor = open(&fx, "Entropy rises in isolated systems.");
    assert!(editor.select_text("Entropy"));
    let config = SynapseConfig::default();

    let artifact = fx
        .orchestrator
        .explain_and_link(editor.as_ref(), &config)
        .await
        .unwrap();

    assert_eq!(artifact.path, "Explanations/Entropy.md");
    let body = fx.vault.read("Explanations/Entropy.md").unwrap();
    assert_eq!(
        body,
        "# Entropy\n\nEntropy is a measure of disorder.\n\n---\n*Generated by Synapse AI*\n*Created: 2026-10-19*"
    );
    assert_eq!(
        editor.value(),
        "[[Explanations/Entropy|Entropy]] rises in isolated systems."
    );
    let requests = fx.provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt, "Explain this concept: \"Entropy\"");
    assert!(requests[0].history.is_none());
    let notice = fx.notices.last().unwrap();
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Created and linked note: Entropy");

    // Same title again: rejected before any generation call.
    assert!(editor.select_text("Entropy"));
    let err = fx
        .orchestrator
        .explain_and_link(editor.as_ref(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, SynapseError::Conflict(ref title) if title == "Entropy"));
    assert_eq!(fx.provider.request_count(), 1);
    assert_eq!(
        fx.notices.last().unwrap().message,
        "Note \"Entropy\" already exists"
    );
}

#[tokio::test]
async fn test_explain_links_selected_text_after_concurrent_edit() {
    let fx = fixture(ScriptedProvider::replying(&["Heat flows downhill."]));
    let editor = open(&fx, "Intro\nSecond law of thermodynamics");
    assert!(editor.select_text("Second law"));

    let typed = editor.clone();
    fx.provider.on_generate(move |_| {
        typed.clear_selection();
        typed.set_value(&format!("New first line\n{}", typed.value()));
    });

    let artifact = fx
        .orchestrator
        .explain_and_link(editor.as_ref(), &SynapseConfig::default())
        .await
        .unwrap();

    assert_eq!(artifact.title, "Second law");
    assert_eq!(
        editor.value(),
        "New first line\nIntro\n[[Explanations/Second law|Second law]] of thermodynamics"
    );
}

#[tokio::test]
async fn test_explain_without_selection_reports_and_skips_generation() {
    let fx = fixture(ScriptedProvider::replying(&[]));
    let editor = open(&fx, "Nothing selected here");

    let err = fx
        .orchestrator
        .explain_and_link(editor.as_ref(), &SynapseConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SynapseError::Input(_)));
    assert_eq!(fx.provider.request_count(), 0);
    assert_eq!(fx.notices.last().unwrap().message, "Please select text to explain");
    assert_eq!(editor.value(), "Nothing selected here");
}

#[tokio::test]
async fn test_summary_merges_into_frontmatter_and_keeps_concurrent_edits() {
    let fx = fixture(ScriptedProvider::replying(&["- one\n- two"]));
    let editor = open(&fx, "---\nkey: v\n---\nbody");

    let typed = editor.clone();
    fx.provider.on_generate(move |_| {
        typed.set_value(&format!("{}\nmore", typed.value()));
    });

    let placement = fx
        .orchestrator
        .summarize_note(editor.as_ref(), &SynapseConfig::default())
        .await
        .unwrap();

    assert_eq!(placement, SummaryPlacement::Frontmatter);
    assert_eq!(
        editor.value(),
        "---\nkey: v\nsummary:\n  - one\n  - two\n---\n\nbody\nmore"
    );
    assert!(fx.provider.requests()[0]
        .prompt
        .starts_with("Summarize this content:\n\n---\nkey: v"));
    assert_eq!(
        fx.notices.last().unwrap().message,
        "Summary added to frontmatter"
    );
}

#[tokio::test]
async fn test_summary_with_unterminated_frontmatter_goes_to_line_zero() {
    let fx = fixture(ScriptedProvider::replying(&["S"]));
    let doc = "---\ntitle: x\nbody";
    let editor = open(&fx, doc);

    let placement = fx
        .orchestrator
        .summarize_note(editor.as_ref(), &SynapseConfig::default())
        .await
        .unwrap();

    assert_eq!(placement, SummaryPlacement::Top);
    assert_eq!(editor.value(), format!("## Summary\n\nS\n\n---\n\n{}", doc));
    assert_eq!(fx.notices.last().unwrap().message, "Summary added to note");
}

#[tokio::test]
async fn test_summary_bottom_appends_section() {
    let fx = fixture(ScriptedProvider::replying(&["Short."]));
    let editor = open(&fx, "# Note\n\ncontent\n");
    let config = SynapseConfig {
        summary_location: SummaryLocation::Bottom,
        ..SynapseConfig::default()
    };

    let placement = fx
        .orchestrator
        .summarize_note(editor.as_ref(), &config)
        .await
        .unwrap();

    assert_eq!(placement, SummaryPlacement::Bottom);
    assert_eq!(
        editor.value(),
        "# Note\n\ncontent\n\n## Summary\n\nShort.\n\n---\n"
    );
}

#[tokio::test]
async fn test_chat_reply_lands_under_prompt_after_concurrent_edit() {
    let fx = fixture(ScriptedProvider::replying(&["Hi there!"]));
    let editor = open(&fx, "# Chat Session\n\n## Chat\n\n> hello");
    editor.set_cursor(Cursor::new(4, 7));

    let typed = editor.clone();
    fx.provider.on_generate(move |_| {
        assert!(typed.value().ends_with(&format!("> hello\n\n{}", PLACEHOLDER)));
        typed.set_value(&format!("# Pinned\n{}", typed.value()));
    });

    let committed = fx
        .orchestrator
        .send_chat_message(editor.as_ref(), &SynapseConfig::default())
        .await
        .unwrap();

    assert_eq!(
        editor.value(),
        "# Pinned\n# Chat Session\n\n## Chat\n\n> hello\n\nHi there!\n\n> "
    );
    assert_eq!(committed.cursor, Cursor::new(9, 2));
    assert_eq!(editor.cursor(), Cursor::new(9, 2));
    assert_eq!(fx.provider.requests()[0].prompt, "hello");
    assert!(fx.provider.requests()[0].history.is_none());
}

#[tokio::test]
async fn test_chat_reply_replaces_placeholder_below_typed_line() {
    let fx = fixture(ScriptedProvider::replying(&["answer"]));
    let editor = open(&fx, "## Chat\n> q");
    editor.set_cursor(Cursor::new(1, 3));

    let typed = editor.clone();
    fx.provider.on_generate(move |_| {
        typed.set_value(&typed.value().replacen("> q\n", "> q\nmore context\n", 1));
    });

    let committed = fx
        .orchestrator
        .send_chat_message(editor.as_ref(), &SynapseConfig::default())
        .await
        .unwrap();

    assert_eq!(editor.value(), "## Chat\n> q\nmore context\n\nanswer\n\n> ");
    assert_eq!(committed.cursor, Cursor::new(6, 2));
    assert!(!editor.value().contains(PLACEHOLDER));
}

#[tokio::test]
async fn test_chat_failure_after_prompt_edit_leaves_no_placeholder() {
    let fx = fixture(ScriptedProvider::new(vec![Err(SynapseError::transport(
        None,
        "Connection error: refused",
    ))]));
    let editor = open(&fx, "## Chat\n> q");
    editor.set_cursor(Cursor::new(1, 3));

    let typed = editor.clone();
    fx.provider.on_generate(move |_| {
        typed.set_value(&typed.value().replacen("> q\n", "> q typo fixed\n", 1));
    });

    fx.orchestrator
        .send_chat_message(editor.as_ref(), &SynapseConfig::default())
        .await
        .unwrap_err();

    assert_eq!(
        editor.value(),
        format!("## Chat\n> q typo fixed\n\n{}", ERROR_TURN)
    );
    assert!(!editor.value().contains(PLACEHOLDER));
}

#[tokio::test]
async fn test_chat_sends_prior_turns_as_history() {
    let fx = fixture(ScriptedProvider::replying(&["Fine, thanks."]));
    let editor = open(
        &fx,
        "# Chat Session\n\n## Chat\n\n> hello\n\nHi there!\n\n> how are you?",
    );
    editor.set_cursor(Cursor::new(8, 14));

    fx.orchestrator
        .send_chat_message(editor.as_ref(), &SynapseConfig::default())
        .await
        .unwrap();

    let request = &fx.provider.requests()[0];
    assert_eq!(request.prompt, "how are you?");
    assert_eq!(
        request.history.as_deref(),
        Some("User: hello\nAI: Hi there!\n")
    );
    assert!(editor
        .value()
        .ends_with("> how are you?\n\nFine, thanks.\n\n> "));
}

#[tokio::test]
async fn test_chat_failure_leaves_error_turn() {
    let fx = fixture(ScriptedProvider::new(vec![Err(SynapseError::transport(
        None,
        "Connection error: refused",
    ))]));
    let editor = open(&fx, "## Chat\n\n> ping");
    editor.set_cursor(Cursor::new(2, 6));

    let err = fx
        .orchestrator
        .send_chat_message(editor.as_ref(), &SynapseConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SynapseError::Transport { .. }));
    assert_eq!(editor.value(), format!("## Chat\n\n> ping\n\n{}", ERROR_TURN));
    assert!(!editor.value().contains(PLACEHOLDER));
    let notice = fx.notices.last().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(
        notice.message,
        "Error: Failed to generate response: Connection error: refused"
    );
}

#[tokio::test]
async fn test_chat_session_then_first_message() {
    let fx = fixture(ScriptedProvider::replying(&["Welcome."]));
    let config = SynapseConfig::default();

    let session = fx.orchestrator.start_chat_session(&config).unwrap();
    assert_eq!(session.path, "Chats/Chat-2026-10-19T09-30-00-000Z.md");

    let editor = BufferEditor::new(session.text.clone());
    editor.set_cursor(session.cursor);
    let line = editor.line(session.cursor.line).unwrap();
    editor.set_line(session.cursor.line, &format!("{}first question", line));
    editor.set_cursor(Cursor::new(session.cursor.line, 16));

    fx.orchestrator
        .send_chat_message(&editor, &config)
        .await
        .unwrap();

    assert!(editor
        .value()
        .contains("> first question\n\nWelcome.\n\n> "));
    let messages: Vec<String> = fx.notices.snapshot().into_iter().map(|n| n.message).collect();
    assert_eq!(messages, vec!["Started new chat session", "Synapse replied"]);
}

#[tokio::test]
async fn test_flashcards_accumulate_in_one_note() {
    let fx = fixture(ScriptedProvider::replying(&[
        "Q: What is entropy?\nA: Disorder.",
        "Q: Second law?\nA: Entropy never decreases.",
    ]));
    let editor = open(&fx, "Entropy is disorder.\nThe second law says it grows.");
    let config = SynapseConfig::default();

    assert!(editor.select_text("Entropy is disorder."));
    let first = fx
        .orchestrator
        .create_flashcards(editor.as_ref(), &config)
        .await
        .unwrap();
    assert_eq!(first.path, "Flashcards/Thermo - Flashcards.md");
    assert!(!first.appended);
    assert_eq!(fx.notices.last().unwrap().message, "Created new flashcards note");
    assert!(editor
        .value()
        .starts_with("Entropy is disorder.\n\n[[Flashcards/Thermo - Flashcards|Flashcards for this note]]\n"));

    assert!(editor.select_text("The second law says it grows."));
    let second = fx
        .orchestrator
        .create_flashcards(editor.as_ref(), &config)
        .await
        .unwrap();
    assert!(second.appended);
    assert_eq!(
        fx.notices.last().unwrap().message,
        "Added flashcards to existing note"
    );

    let note = fx.vault.read(&first.path).unwrap();
    assert!(note.starts_with("# Flashcards for Thermo\n\nQ: What is entropy?"));
    assert!(note.contains("*Generated from: [[Physics/Thermo]]*"));
    assert!(note.ends_with("## New Flashcards\n\nQ: Second law?\nA: Entropy never decreases."));
}

#[tokio::test]
async fn test_dispatch_suggest_then_accept() {
    let fx = fixture(ScriptedProvider::replying(&[" and heat flows from hot to cold."]));
    let editor = open(&fx, "The second law of thermodynamics");
    editor.set_cursor(Cursor::new(0, 32));
    let config = SynapseConfig {
        enable_live_suggestions: true,
        ..SynapseConfig::default()
    };

    let outcome = fx
        .orchestrator
        .dispatch(UserIntent::SuggestContinuation, editor.as_ref(), &config)
        .await
        .unwrap();
    let suggestion = match outcome {
        IntentOutcome::Suggested(Some(suggestion)) => suggestion,
        other => panic!("expected a suggestion, got {:?}", other),
    };
    assert_eq!(suggestion.text, "and heat flows from hot to cold.");
    assert_eq!(
        fx.notices.last().unwrap().message,
        "Suggestion: and heat flows from hot to cold."
    );

    let outcome = fx
        .orchestrator
        .dispatch(UserIntent::AcceptSuggestion(suggestion), editor.as_ref(), &config)
        .await
        .unwrap();
    assert_eq!(outcome, IntentOutcome::SuggestionAccepted);
    assert_eq!(
        editor.value(),
        "The second law of thermodynamicsand heat flows from hot to cold."
    );
}

#[tokio::test]
async fn test_suggestions_disabled_make_no_request() {
    let fx = fixture(ScriptedProvider::replying(&["unused"]));
    let editor = open(&fx, "Plenty of context on this line");

    let outcome = fx
        .orchestrator
        .dispatch(
            UserIntent::SuggestContinuation,
            editor.as_ref(),
            &SynapseConfig::default(),
        )
        .await
        .unwrap();

    assert_eq!(outcome, IntentOutcome::Suggested(None));
    assert_eq!(fx.provider.request_count(), 0);
}

#[tokio::test]
async fn test_system_prompt_renders_variables() {
    let fx = fixture(ScriptedProvider::replying(&["ok"]));
    let editor = open(&fx, "Some note content");
    let mut config = SynapseConfig::default();
    config.system_prompts.summary =
        "Summarize for {{courseName}} in {{maxResponseLength}} chars on {{date}}.".to_string();
    config
        .custom_template_variables
        .insert("courseName".to_string(), "Thermo 101".to_string());

    fx.orchestrator
        .summarize_note(editor.as_ref(), &config)
        .await
        .unwrap();

    assert_eq!(
        fx.provider.requests()[0].system_prompt,
        "Summarize for Thermo 101 in 1000 chars on 2026-10-19."
    );
}
