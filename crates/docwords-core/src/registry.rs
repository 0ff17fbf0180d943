//! The set of live indices, one per open document.

use crate::document::{DocumentId, HostDocument};
use crate::settings::CompiledSettings;
use crate::word_index::WordIndex;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::path::Path;

/// The word currently being typed.
///
/// Last write wins. It is passed explicitly to the diff pipeline (which writes it) and to the
/// provider (which hides it from suggestions).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveWord(Option<String>);

impl ActiveWord {
    /// Record `word` as the most recently tokenized word. Empty words are ignored.
    pub fn set(&mut self, word: &str) {
        if word.is_empty() {
            return;
        }
        match &mut self.0 {
            Some(current) => {
                current.clear();
                current.push_str(word);
            }
            None => self.0 = Some(word.to_string()),
        }
    }

    /// The active word, if any.
    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Forget the active word.
    pub fn clear(&mut self) {
        self.0 = None;
    }
}

/// Maps each indexed document to its [`WordIndex`].
#[derive(Debug, Clone, Default)]
pub struct IndexRegistry {
    indices: BTreeMap<DocumentId, WordIndex>,
}

impl IndexRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if no document is indexed.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns `true` if `id` has an index.
    pub fn contains(&self, id: &DocumentId) -> bool {
        self.indices.contains_key(id)
    }

    /// Index of `id`.
    pub fn get(&self, id: &DocumentId) -> Option<&WordIndex> {
        self.indices.get(id)
    }

    /// Mutable index of `id`.
    pub fn get_mut(&mut self, id: &DocumentId) -> Option<&mut WordIndex> {
        self.indices.get_mut(id)
    }

    /// Install an index, replacing any previous one for the same document.
    pub fn insert(&mut self, index: WordIndex) -> Option<WordIndex> {
        self.indices.insert(index.document().clone(), index)
    }

    /// Drop the index of `id`.
    pub fn remove(&mut self, id: &DocumentId) -> Option<WordIndex> {
        self.indices.remove(id)
    }

    /// Drop every index.
    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// All indices, ordered by document id.
    pub fn iter(&self) -> btree_map::Iter<'_, DocumentId, WordIndex> {
        self.indices.iter()
    }
}

/// Build the index of `doc` from scratch.
///
/// Scans at most `max_lines` lines, then records the file stem (if the document has a path) as
/// one more occurrence.
pub fn parse_document(doc: &dyn HostDocument, settings: &CompiledSettings) -> WordIndex {
    let rules = settings.rules();
    let policy = settings.policy();
    let language = doc.language_id();
    let mut index = WordIndex::new(doc.id().clone(), doc.display_name());

    let lines = doc.line_count().min(settings.settings().max_lines);
    for line_no in 0..lines {
        let Some(line) = doc.line(line_no) else {
            break;
        };
        for word in rules.tokenize(language, &line) {
            index.add_word(word, policy);
        }
    }

    if let Some(stem) = doc.path().and_then(Path::file_stem) {
        let stem = stem.to_string_lossy();
        index.add_word(&rules.strip_boundaries(language, &stem), policy);
    }

    tracing::debug!(
        document = %doc.id(),
        lines,
        words = index.len(),
        "parsed document"
    );
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextDocument;
    use crate::settings::Settings;

    #[test]
    fn test_active_word_last_write_wins() {
        let mut active = ActiveWord::default();
        assert_eq!(active.get(), None);
        active.set("first");
        active.set("second");
        active.set("");
        assert_eq!(active.get(), Some("second"));
        active.clear();
        assert_eq!(active.get(), None);
    }

    #[test]
    fn test_parse_document_counts_and_file_stem() {
        let settings = CompiledSettings::default();
        let doc = TextDocument::new(
            "file:///w/widget_util.rs",
            "rust",
            "widget widget ab\nwidget.build()",
        )
        .with_path("/w/widget_util.rs");
        let index = parse_document(&doc, &settings);

        assert_eq!(index.count("widget"), 3);
        assert_eq!(index.count("build"), 1);
        assert_eq!(index.count("ab"), 0);
        assert_eq!(index.count("widget_util"), 1);
        assert_eq!(index.display_name(), "widget_util.rs");
    }

    #[test]
    fn test_parse_document_respects_max_lines() {
        let settings = CompiledSettings::compile(Settings {
            max_lines: 2,
            ..Settings::default()
        });
        let doc = TextDocument::new("d", "plaintext", "alpha\nbeta\ngamma\n");
        let index = parse_document(&doc, &settings);

        assert_eq!(index.count("alpha"), 1);
        assert_eq!(index.count("beta"), 1);
        assert_eq!(index.count("gamma"), 0);
    }

    #[test]
    fn test_registry_insert_replace_remove() {
        let settings = CompiledSettings::default();
        let mut registry = IndexRegistry::new();
        let a = TextDocument::new("a", "plaintext", "apple");
        let b = TextDocument::new("b", "plaintext", "banana");

        assert!(registry.insert(parse_document(&a, &settings)).is_none());
        assert!(registry.insert(parse_document(&b, &settings)).is_none());
        assert!(registry.insert(parse_document(&a, &settings)).is_some());
        assert_eq!(registry.len(), 2);

        let ids: Vec<&str> = registry.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        registry.remove(&DocumentId::new("a"));
        assert!(!registry.contains(&DocumentId::new("a")));
        assert_eq!(registry.get(&DocumentId::new("b")).unwrap().count("banana"), 1);
    }
}
