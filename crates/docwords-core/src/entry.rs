//! Completion entries (owned by a [`crate::WordIndex`]) and aggregated candidates.

use crate::document::DocumentId;

/// One distinct word of one document, with its occurrence count.
///
/// An entry normally lives at the trie path of its own label. Words with diacritics get a
/// second entry with the same label stored under their folded form; that entry carries the
/// folded form as `override_key` and mirrors the primary entry's count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The word itself.
    pub label: String,
    /// Document the word occurs in.
    pub document: DocumentId,
    /// Number of live occurrences. Never observed below 1 while the entry is indexed.
    pub count: usize,
    /// Folded key this entry is stored under, when it is a diacritic variant.
    pub override_key: Option<String>,
}

impl Entry {
    pub(crate) fn new(label: impl Into<String>, document: DocumentId) -> Self {
        Self {
            label: label.into(),
            document,
            count: 1,
            override_key: None,
        }
    }

    pub(crate) fn variant(
        label: impl Into<String>,
        document: DocumentId,
        key: impl Into<String>,
        count: usize,
    ) -> Self {
        Self {
            label: label.into(),
            document,
            count,
            override_key: Some(key.into()),
        }
    }

    /// Returns `true` for diacritic-variant entries.
    pub fn is_variant(&self) -> bool {
        self.override_key.is_some()
    }
}

/// A completion suggestion produced by the provider.
///
/// Candidates are copies: merging details or prepending a lead character never touches the
/// index's entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionCandidate {
    /// Text shown in the list.
    pub label: String,
    /// Document the representative entry came from.
    pub document: DocumentId,
    /// Occurrences summed over every document that contributed.
    pub count: usize,
    /// Detail of the representative document, `"<display name> (<count>)"`.
    pub detail: String,
    /// One detail per contributing document, representative first.
    pub details: Vec<String>,
    /// Text to insert instead of `label`.
    pub insert_text: Option<String>,
    /// Text the host should filter on instead of `label`.
    pub filter_text: Option<String>,
    /// Zero-padded rank in the final list, so hosts that sort by key keep the ranking.
    pub sort_text: Option<String>,
}

impl CompletionCandidate {
    pub(crate) fn from_entry(entry: &Entry, display_name: &str) -> Self {
        let detail = format_detail(display_name, entry.count);
        Self {
            label: entry.label.clone(),
            document: entry.document.clone(),
            count: entry.count,
            details: vec![detail.clone()],
            detail,
            insert_text: None,
            filter_text: entry.override_key.clone(),
            sort_text: None,
        }
    }

    /// Text that ends up in the document when this candidate is accepted.
    pub fn insertion_text(&self) -> &str {
        self.insert_text.as_deref().unwrap_or(&self.label)
    }

    /// All merged details, one per line.
    pub fn documentation(&self) -> String {
        self.details.join("\n")
    }
}

pub(crate) fn format_detail(display_name: &str, count: usize) -> String {
    format!("{display_name} ({count})")
}
