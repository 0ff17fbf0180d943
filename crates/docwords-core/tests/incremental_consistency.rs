//! Incremental maintenance validation
//!
//! Apply many random edits to a live document through the engine, and after each one check
//! that the incrementally maintained index matches a full rescan of the document.

use docwords_core::{
    CompletionEngine, ContentChange, EditOutcome, HostDocument, Position, Settings, TextDocument,
    TextRange, parse_document,
};
use rand::Rng;
use rand::rngs::ThreadRng;

const FRAGMENTS: &[&str] = &[
    "x",
    "foo",
    "bar_baz",
    " ",
    "  ",
    "\n",
    ".",
    "(",
    "->",
    "café",
    "naïve ",
    "hello world\n",
    "$var",
    "margin-top",
    "你好",
    "line one\nline two\n",
];

fn seed_text(lines: usize) -> String {
    let mut text = String::new();
    for i in 0..lines {
        text.push_str(&format!(
            "fn item_{i}(config: &Config) -> Result {{ config.load(café_{i}) }}\n"
        ));
    }
    text
}

fn random_position(rng: &mut ThreadRng, doc: &TextDocument) -> Position {
    let line = rng.gen_range(0..doc.line_count());
    let character = rng.gen_range(0..=doc.line_len_chars(line));
    Position::new(line, character)
}

fn random_change(rng: &mut ThreadRng, doc: &TextDocument) -> ContentChange {
    let a = random_position(rng, doc);
    let range = match rng.gen_range(0..3) {
        0 => TextRange::caret(a),
        1 => {
            // Short single-line range.
            let len = doc.line_len_chars(a.line);
            let end = (a.character + rng.gen_range(0..6)).min(len);
            TextRange::new(a, Position::new(a.line, end))
        }
        _ => TextRange::new(a, random_position(rng, doc)),
    };
    let text = if rng.gen_bool(0.3) {
        String::new()
    } else {
        FRAGMENTS[rng.gen_range(0..FRAGMENTS.len())].to_string()
    };
    ContentChange::new(range, text)
}

fn assert_matches_rescan(engine: &CompletionEngine, doc: &TextDocument, step: usize) {
    let live = engine
        .registry()
        .get(doc.id())
        .expect("document should stay indexed");
    let rescan = parse_document(doc, engine.settings());
    assert_eq!(
        live.word_counts(),
        rescan.word_counts(),
        "counts diverged after step {step}\n--- text ---\n{}",
        doc.text()
    );
    assert_eq!(live.node_count(), rescan.node_count(), "trie shape diverged after step {step}");
}

fn run_random_edits(language: &str, steps: usize) {
    let mut rng = rand::thread_rng();
    let mut doc = TextDocument::new("file:///w/random_doc.rs", language, &seed_text(20))
        .with_path("/w/random_doc.rs");
    let mut engine = CompletionEngine::new(Settings::default()).with_workspace_root("/w");
    engine.on_document_opened(&doc);
    engine.on_active_document_changed(Some(&doc));

    for step in 0..steps {
        let batch = if rng.gen_bool(0.8) { 1 } else { rng.gen_range(2..4) };
        let mut changes = Vec::with_capacity(batch);
        for _ in 0..batch {
            // Each change is relative to the document after the previous ones.
            let change = random_change(&mut rng, &doc);
            doc.apply_change(&change);
            changes.push(change);
        }

        let outcome = engine.on_document_edited(&doc, &changes);
        assert!(outcome.is_applied(), "edit skipped at step {step}: {outcome:?}");
        if batch > 1 {
            assert_eq!(outcome, EditOutcome::Reloaded);
        }
        assert_matches_rescan(&engine, &doc, step);
    }
}

#[test]
fn test_random_edits_match_full_rescan() {
    run_random_edits("rust", 400);
}

#[test]
fn test_random_edits_match_full_rescan_with_sigil_language() {
    run_random_edits("php", 200);
}

#[test]
fn test_random_edits_with_custom_boundary() {
    let mut rng = rand::thread_rng();
    let mut settings = Settings::default();
    settings
        .language_whitespace
        .insert("css".to_string(), r"[^\w-]+".to_string());
    let mut doc = TextDocument::new(
        "file:///w/site.css",
        "css",
        ".header { margin-top: 4px; padding-left: 2em; }\n.footer { border-top-width: 1px; }\n",
    );
    let mut engine = CompletionEngine::new(settings);
    engine.on_document_opened(&doc);
    engine.on_active_document_changed(Some(&doc));

    for step in 0..200 {
        let change = random_change(&mut rng, &doc);
        doc.apply_change(&change);
        engine.on_document_edited(&doc, std::slice::from_ref(&change));
        assert_matches_rescan(&engine, &doc, step);
    }
}

#[test]
fn test_typing_word_character_by_character() {
    let mut doc = TextDocument::new("a", "rust", "let x = ;\n");
    let mut engine = CompletionEngine::new(Settings::default());
    engine.on_document_opened(&doc);
    engine.on_active_document_changed(Some(&doc));

    for (i, ch) in "configuration".chars().enumerate() {
        let change = ContentChange::insert(Position::new(0, 8 + i), ch.to_string());
        doc.apply_change(&change);
        assert_eq!(
            engine.on_document_edited(&doc, &[change]),
            EditOutcome::Patched
        );
    }

    let index = engine.registry().get(doc.id()).unwrap();
    assert_eq!(index.count("configuration"), 1);
    assert_eq!(index.count("config"), 0);
    assert_eq!(index.count("con"), 0);
    assert_eq!(engine.active_word().get(), Some("configuration"));
    assert_eq!(index.word_counts(), parse_document(&doc, engine.settings()).word_counts());
}
