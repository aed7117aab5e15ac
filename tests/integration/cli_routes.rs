//! CLI route table against a filesystem vault with a scripted backend.

use crate::integration::test_utils::ScriptedProvider;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use synapse::chat::ERROR_TURN;
use synapse::cli::{exit_code, ChatCommands, Commands, ConfigCommands, RunContext};
use synapse::config::{ConfigLoader, SynapseConfig};
use synapse::SynapseError;
use tempfile::TempDir;

fn context(root: &Path, provider: ScriptedProvider) -> RunContext {
    RunContext::with_provider(
        root.to_path_buf(),
        SynapseConfig::default(),
        Arc::new(provider),
    )
    .unwrap()
}

fn write_note(root: &Path, path: &str, text: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, text).unwrap();
}

#[test]
fn test_explain_writes_note_and_links_source() {
    let temp = TempDir::new().unwrap();
    write_note(temp.path(), "Physics/Thermo.md", "Entropy rises in isolated systems.\n");
    let ctx = context(temp.path(), ScriptedProvider::replying(&["Disorder, roughly."]));

    let output = ctx
        .execute(&Commands::Explain {
            note: "Physics/Thermo.md".to_string(),
            selection: "Entropy".to_string(),
        })
        .unwrap();

    assert!(output.contains("Created and linked note: Entropy"));
    assert!(output.ends_with("Wrote Explanations/Entropy.md"));
    let note = fs::read_to_string(temp.path().join("Explanations/Entropy.md")).unwrap();
    assert!(note.starts_with("# Entropy\n\nDisorder, roughly.\n\n---\n*Generated by Synapse AI*"));
    assert_eq!(
        fs::read_to_string(temp.path().join("Physics/Thermo.md")).unwrap(),
        "[[Explanations/Entropy|Entropy]] rises in isolated systems.\n"
    );

    let err = ctx
        .execute(&Commands::Explain {
            note: "Physics/Thermo.md".to_string(),
            selection: "missing words".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, SynapseError::Input(_)));
    assert_eq!(exit_code(&err), 2);
}

#[test]
fn test_explain_conflict_exit_code() {
    let temp = TempDir::new().unwrap();
    write_note(temp.path(), "Notes.md", "Entropy again");
    write_note(temp.path(), "Explanations/Entropy.md", "# Entropy\n\nexisting");
    let provider = ScriptedProvider::replying(&["never used"]);
    let ctx = context(temp.path(), provider);

    let err = ctx
        .execute(&Commands::Explain {
            note: "Notes.md".to_string(),
            selection: "Entropy".to_string(),
        })
        .unwrap_err();

    assert!(matches!(err, SynapseError::Conflict(_)));
    assert_eq!(exit_code(&err), 4);
    assert_eq!(
        fs::read_to_string(temp.path().join("Notes.md")).unwrap(),
        "Entropy again"
    );
}

#[test]
fn test_summarize_updates_note_on_disk() {
    let temp = TempDir::new().unwrap();
    write_note(temp.path(), "Lecture.md", "---\nkey: v\n---\nbody");
    let ctx = context(temp.path(), ScriptedProvider::replying(&["- one\n- two"]));

    let output = ctx
        .execute(&Commands::Summarize {
            note: "Lecture.md".to_string(),
        })
        .unwrap();

    assert!(output.contains("Summary added to frontmatter"));
    assert_eq!(
        fs::read_to_string(temp.path().join("Lecture.md")).unwrap(),
        "---\nkey: v\nsummary:\n  - one\n  - two\n---\n\nbody"
    );
}

#[test]
fn test_flashcards_route_creates_then_appends() {
    let temp = TempDir::new().unwrap();
    write_note(temp.path(), "Bio/Cells.md", "Mitochondria make ATP.\nRibosomes make proteins.");
    let ctx = context(
        temp.path(),
        ScriptedProvider::replying(&["Q: ATP?\nA: Mitochondria.", "Q: Proteins?\nA: Ribosomes."]),
    );

    let first = ctx
        .execute(&Commands::Flashcards {
            note: "Bio/Cells.md".to_string(),
            selection: "Mitochondria make ATP.".to_string(),
        })
        .unwrap();
    assert!(first.ends_with("Wrote Flashcards/Cells - Flashcards.md"));

    ctx.execute(&Commands::Flashcards {
        note: "Bio/Cells.md".to_string(),
        selection: "Ribosomes make proteins.".to_string(),
    })
    .unwrap();

    let cards =
        fs::read_to_string(temp.path().join("Flashcards/Cells - Flashcards.md")).unwrap();
    assert!(cards.contains("Q: ATP?"));
    assert!(cards.ends_with("## New Flashcards\n\nQ: Proteins?\nA: Ribosomes."));
    let source = fs::read_to_string(temp.path().join("Bio/Cells.md")).unwrap();
    assert_eq!(
        source
            .matches("[[Flashcards/Cells - Flashcards|Flashcards for this note]]")
            .count(),
        2
    );
}

#[test]
fn test_chat_new_then_send() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path(), ScriptedProvider::replying(&["Hello back."]));

    let output = ctx
        .execute(&Commands::Chat {
            command: ChatCommands::New,
        })
        .unwrap();
    assert!(output.contains("Started new chat session"));

    let chat_dir = temp.path().join("Chats");
    let entries: Vec<_> = fs::read_dir(&chat_dir).unwrap().collect();
    assert_eq!(entries.len(), 1);
    let file_name = entries[0].as_ref().unwrap().file_name();
    let file_name = file_name.to_str().unwrap();
    assert!(file_name.starts_with("Chat-") && file_name.ends_with(".md"));

    let note = format!("Chats/{}", file_name);
    let text = fs::read_to_string(temp.path().join(&note)).unwrap();
    let text = text.replacen("\n> \n", "\n> hi\n", 1);
    fs::write(temp.path().join(&note), &text).unwrap();
    let line = text.split('\n').position(|l| l == "> hi").unwrap();

    let output = ctx
        .execute(&Commands::Chat {
            command: ChatCommands::Send {
                note: note.clone(),
                line: Some(line),
            },
        })
        .unwrap();
    assert!(output.ends_with(&format!("Next prompt on line {}", line + 4)));
    let saved = fs::read_to_string(temp.path().join(&note)).unwrap();
    assert!(saved.contains("> hi\n\nHello back.\n\n> "));
}

#[test]
fn test_chat_send_failure_saves_error_turn() {
    let temp = TempDir::new().unwrap();
    write_note(temp.path(), "Chat.md", "## Chat\n\n> ping");
    let ctx = context(
        temp.path(),
        ScriptedProvider::new(vec![Err(SynapseError::transport(Some(500), "HTTP error: 500"))]),
    );

    let err = ctx
        .execute(&Commands::Chat {
            command: ChatCommands::Send {
                note: "Chat.md".to_string(),
                line: None,
            },
        })
        .unwrap_err();

    assert_eq!(exit_code(&err), 5);
    assert_eq!(
        fs::read_to_string(temp.path().join("Chat.md")).unwrap(),
        format!("## Chat\n\n> ping\n\n{}", ERROR_TURN)
    );
}

#[test]
fn test_suggest_with_accept_inserts_text() {
    let temp = TempDir::new().unwrap();
    write_note(temp.path(), "Draft.md", "Water boils at");
    let ctx = context(temp.path(), ScriptedProvider::replying(&[" 100 degrees Celsius."]));

    let output = ctx
        .execute(&Commands::Suggest {
            note: "Draft.md".to_string(),
            line: 0,
            accept: true,
        })
        .unwrap();

    assert!(output.ends_with("Inserted: 100 degrees Celsius."));
    assert_eq!(
        fs::read_to_string(temp.path().join("Draft.md")).unwrap(),
        "Water boils at100 degrees Celsius."
    );
}

#[test]
fn test_models_and_templates_listing() {
    let temp = TempDir::new().unwrap();
    write_note(temp.path(), "Templates/Explanation.md", "# {{title}}\n\n{{content}}");
    write_note(temp.path(), "Other.md", "not a template");
    let ctx = context(temp.path(), ScriptedProvider::replying(&[]));

    let models = ctx.execute(&Commands::Models).unwrap();
    assert!(models.contains("gemma3n:e2b"));
    assert!(models.contains("llama3"));

    let templates = ctx.execute(&Commands::Templates).unwrap();
    assert!(templates.contains("Templates/Explanation.md"));
    assert!(!templates.contains("Other.md"));
}

#[test]
fn test_explain_uses_vault_template() {
    let temp = TempDir::new().unwrap();
    write_note(
        temp.path(),
        "Templates/Explanation.md",
        "# {{title}}\nQuery: {{query}}\n\n{{content}}\n\n{{date}} {{courseName}}",
    );
    write_note(temp.path(), "Notes.md", "Osmosis is diffusion of water.");
    let mut config = SynapseConfig::default();
    config.use_template_for_explanations = true;
    config.template_path = "Templates/Explanation.md".to_string();
    config
        .custom_template_variables
        .insert("courseName".to_string(), "Biology".to_string());
    let ctx = RunContext::with_provider(
        temp.path().to_path_buf(),
        config,
        Arc::new(ScriptedProvider::replying(&["Water crosses a membrane."])),
    )
    .unwrap();

    ctx.execute(&Commands::Explain {
        note: "Notes.md".to_string(),
        selection: "Osmosis".to_string(),
    })
    .unwrap();

    let note = fs::read_to_string(temp.path().join("Explanations/Osmosis.md")).unwrap();
    assert!(note.starts_with("# Osmosis\nQuery: Osmosis\n\nWater crosses a membrane.\n\n"));
    assert!(note.ends_with(" Biology"));
    assert!(!note.contains("{{"));
}

#[test]
fn test_config_init_show_and_force() {
    let temp = TempDir::new().unwrap();
    let ctx = context(temp.path(), ScriptedProvider::replying(&[]));
    let init = || {
        ctx.execute(&Commands::Config {
            command: ConfigCommands::Init { force: false },
        })
    };

    init().unwrap();
    let path = ConfigLoader::vault_config_path(temp.path());
    assert!(path.exists());
    let written = ConfigLoader::load_from_file(&path).unwrap();
    assert_eq!(written.model_name, SynapseConfig::default().model_name);
    assert_eq!(written.summary_location, SynapseConfig::default().summary_location);

    let err = init().unwrap_err();
    assert!(matches!(err, SynapseError::Conflict(_)));

    ctx.execute(&Commands::Config {
        command: ConfigCommands::Init { force: true },
    })
    .unwrap();

    let shown = ctx
        .execute(&Commands::Config {
            command: ConfigCommands::Show,
        })
        .unwrap();
    assert!(shown.contains("model_name = \"gemma3n:e2b\""));
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp = TempDir::new().unwrap();
    let config = SynapseConfig {
        generation_endpoint: "localhost:11434".to_string(),
        ..SynapseConfig::default()
    };
    let result = RunContext::with_provider(
        temp.path().to_path_buf(),
        config,
        Arc::new(ScriptedProvider::replying(&[])),
    );
    let err = result.err().unwrap();
    assert!(matches!(err, SynapseError::Config(_)));
    assert_eq!(exit_code(&err), 6);
}
