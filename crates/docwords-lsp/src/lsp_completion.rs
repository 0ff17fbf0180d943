//! Candidate -> LSP `CompletionItem` conversion.

use docwords_core::CompletionCandidate;
use serde_json::{Map, Value, json};

/// `CompletionItemKind.Text`.
pub const COMPLETION_KIND_TEXT: u64 = 1;

/// Build one `CompletionItem`.
///
/// `insertText`, `filterText` and `sortText` are only present when the candidate sets them.
/// Candidates coming out of the engine always carry a rank-ordered `sortText`.
pub fn completion_item(candidate: &CompletionCandidate) -> Value {
    let mut item = Map::new();
    item.insert("label".into(), json!(candidate.label));
    item.insert("kind".into(), json!(COMPLETION_KIND_TEXT));
    item.insert("detail".into(), json!(candidate.detail));
    item.insert("documentation".into(), json!(candidate.documentation()));
    let overrides = [
        ("insertText", &candidate.insert_text),
        ("filterText", &candidate.filter_text),
        ("sortText", &candidate.sort_text),
    ];
    for (key, value) in overrides {
        if let Some(value) = value {
            item.insert(key.into(), json!(value));
        }
    }
    Value::Object(item)
}

/// Build a `CompletionList`.
///
/// The list is marked incomplete so the client asks again as the prefix grows: merged counts
/// and the word being typed change with every keystroke.
pub fn completion_list(candidates: &[CompletionCandidate]) -> Value {
    json!({
        "isIncomplete": true,
        "items": candidates.iter().map(completion_item).collect::<Vec<_>>(),
    })
}
