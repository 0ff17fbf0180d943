//! Per-document prefix index.
//!
//! A [`WordIndex`] is a character trie stored in an arena (`Vec<Node>` plus a free list). Each
//! node holds at most one primary [`Entry`] (the word spelled by the path to the node) and any
//! number of diacritic variants (accented words whose folded form is that path).
//!
//! Entries are reference counted: adding a word increments its count, removing it decrements,
//! and an entry that reaches zero is removed together with every trie node that no longer
//! leads anywhere.

use crate::document::DocumentId;
use crate::entry::Entry;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

type NodeId = usize;

const ROOT: NodeId = 0;

/// Strip diacritics: `café` -> `cafe`. Borrows when there is nothing to strip.
pub fn fold_diacritics(word: &str) -> Cow<'_, str> {
    if word.is_ascii() {
        return Cow::Borrowed(word);
    }
    let folded: String = word
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .nfc()
        .collect();
    if folded == word {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(folded)
    }
}

/// Which words are worth indexing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordPolicy {
    /// Words shorter than this (in characters) are ignored.
    pub min_word_length: usize,
    /// Words that are never indexed.
    pub ignored_words: HashSet<String>,
}

impl WordPolicy {
    /// Create a policy with a minimum length and no ignored words.
    pub fn new(min_word_length: usize) -> Self {
        Self {
            min_word_length,
            ignored_words: HashSet::new(),
        }
    }

    /// Returns `true` if `word` should be indexed.
    pub fn accepts(&self, word: &str) -> bool {
        !word.is_empty()
            && word.chars().count() >= self.min_word_length
            && !self.ignored_words.contains(word)
    }
}

#[derive(Debug, Clone, Default)]
struct Node {
    children: BTreeMap<char, NodeId>,
    parent: Option<(NodeId, char)>,
    primary: Option<Entry>,
    variants: Vec<Entry>,
}

impl Node {
    fn is_dead(&self) -> bool {
        self.primary.is_none() && self.variants.is_empty() && self.children.is_empty()
    }
}

/// The prefix index of one document.
#[derive(Debug, Clone)]
pub struct WordIndex {
    document: DocumentId,
    display_name: String,
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    words: usize,
}

impl WordIndex {
    /// Create an empty index for `document`.
    pub fn new(document: DocumentId, display_name: impl Into<String>) -> Self {
        Self {
            document,
            display_name: display_name.into(),
            nodes: vec![Node::default()],
            free: Vec::new(),
            words: 0,
        }
    }

    /// Document this index belongs to.
    pub fn document(&self) -> &DocumentId {
        &self.document
    }

    /// Name shown next to suggestions from this document.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.words
    }

    /// Returns `true` if no word is indexed.
    pub fn is_empty(&self) -> bool {
        self.words == 0
    }

    /// Number of live trie nodes (root included).
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Occurrence count of the exact word `word` (0 when absent).
    pub fn count(&self, word: &str) -> usize {
        self.lookup(word)
            .and_then(|id| self.nodes[id].primary.as_ref())
            .map_or(0, |entry| entry.count)
    }

    /// Every distinct word with its count, sorted by word.
    pub fn word_counts(&self) -> BTreeMap<String, usize> {
        self.entries()
            .map(|entry| (entry.label.clone(), entry.count))
            .collect()
    }

    /// Every primary entry, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.nodes.iter().filter_map(|node| node.primary.as_ref())
    }

    /// Record one occurrence of `word`.
    ///
    /// Words the policy rejects are silently ignored. Returns `true` if the index changed.
    pub fn add_word(&mut self, word: &str, policy: &WordPolicy) -> bool {
        if !policy.accepts(word) {
            return false;
        }

        let node = self.ensure_path(word);
        let count = if let Some(entry) = self.nodes[node].primary.as_mut() {
            entry.count += 1;
            entry.count
        } else {
            self.nodes[node].primary = Some(Entry::new(word, self.document.clone()));
            self.words += 1;
            1
        };

        let folded = fold_diacritics(word);
        if folded != word {
            let key_node = self.ensure_path(&folded);
            let variants = &mut self.nodes[key_node].variants;
            match variants.iter_mut().find(|entry| entry.label == word) {
                Some(entry) => entry.count = count,
                None => variants.push(Entry::variant(
                    word,
                    self.document.clone(),
                    folded.as_ref(),
                    count,
                )),
            }
        }

        true
    }

    /// Remove one occurrence of `word`.
    ///
    /// Only the entry labelled exactly `word` is touched. Returns `true` if the index changed.
    pub fn remove_word(&mut self, word: &str, policy: &WordPolicy) -> bool {
        if !policy.accepts(word) {
            return false;
        }
        let Some(node) = self.lookup(word) else {
            return false;
        };
        let Some(entry) = self.nodes[node].primary.as_mut() else {
            return false;
        };

        entry.count = entry.count.saturating_sub(1);
        let remaining = entry.count;
        if remaining == 0 {
            self.nodes[node].primary = None;
            self.words -= 1;
            self.prune(node);
        }

        let folded = fold_diacritics(word);
        if folded != word
            && let Some(key_node) = self.lookup(&folded)
        {
            let variants = &mut self.nodes[key_node].variants;
            if let Some(pos) = variants.iter().position(|entry| entry.label == word) {
                if remaining == 0 {
                    variants.swap_remove(pos);
                    self.prune(key_node);
                } else {
                    variants[pos].count = remaining;
                }
            }
        }

        true
    }

    /// Every entry (primary and variant) stored at or below `prefix`.
    ///
    /// Order among matches is unspecified. An empty prefix matches nothing.
    pub fn find(&self, prefix: &str) -> Vec<&Entry> {
        let mut out = Vec::new();
        if prefix.is_empty() {
            return out;
        }
        let Some(start) = self.lookup(prefix) else {
            return out;
        };

        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            out.extend(node.primary.iter());
            out.extend(node.variants.iter());
            stack.extend(node.children.values().rev().copied());
        }
        out
    }

    fn lookup(&self, key: &str) -> Option<NodeId> {
        let mut id = ROOT;
        for ch in key.chars() {
            id = *self.nodes[id].children.get(&ch)?;
        }
        Some(id)
    }

    fn ensure_path(&mut self, key: &str) -> NodeId {
        let mut id = ROOT;
        for ch in key.chars() {
            id = match self.nodes[id].children.get(&ch) {
                Some(&child) => child,
                None => {
                    let child = self.alloc(Node {
                        parent: Some((id, ch)),
                        ..Node::default()
                    });
                    self.nodes[id].children.insert(ch, child);
                    child
                }
            };
        }
        id
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    fn prune(&mut self, mut id: NodeId) {
        while id != ROOT && self.nodes[id].is_dead() {
            let Some((parent, ch)) = self.nodes[id].parent else {
                break;
            };
            self.nodes[parent].children.remove(&ch);
            self.nodes[id] = Node::default();
            self.free.push(id);
            id = parent;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> WordIndex {
        WordIndex::new(DocumentId::new("doc"), "doc.txt")
    }

    fn labels(entries: &[&Entry]) -> Vec<String> {
        let mut out: Vec<String> = entries.iter().map(|e| e.label.clone()).collect();
        out.sort();
        out
    }

    #[test]
    fn test_add_counts_occurrences() {
        let policy = WordPolicy::new(3);
        let mut index = index();
        assert!(index.add_word("widget", &policy));
        assert!(index.add_word("widget", &policy));
        assert!(index.add_word("window", &policy));

        assert_eq!(index.count("widget"), 2);
        assert_eq!(index.count("window"), 1);
        assert_eq!(index.count("wid"), 0);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_min_length_boundary() {
        let policy = WordPolicy::new(3);
        let mut index = index();
        assert!(!index.add_word("ab", &policy));
        assert!(index.add_word("abc", &policy));

        assert_eq!(index.count("ab"), 0);
        assert_eq!(index.count("abc"), 1);
        assert!(index.find("ab").iter().all(|e| e.label == "abc"));
    }

    #[test]
    fn test_ignored_and_empty_words() {
        let mut policy = WordPolicy::new(1);
        policy.ignored_words.insert("the".to_string());
        let mut index = index();
        assert!(!index.add_word("", &policy));
        assert!(!index.add_word("the", &policy));
        assert!(!index.remove_word("", &policy));
        assert!(index.is_empty());
        assert_eq!(index.node_count(), 1);
    }

    #[test]
    fn test_find_is_structural_prefix_search() {
        let policy = WordPolicy::new(1);
        let mut index = index();
        for word in ["config", "configure", "confetti", "cone", "zebra"] {
            index.add_word(word, &policy);
        }

        assert_eq!(
            labels(&index.find("conf")),
            vec!["confetti", "config", "configure"]
        );
        assert_eq!(labels(&index.find("config")), vec!["config", "configure"]);
        assert!(index.find("conx").is_empty());
        assert!(index.find("").is_empty());
    }

    #[test]
    fn test_remove_resolves_exact_label() {
        let policy = WordPolicy::new(1);
        let mut index = index();
        index.add_word("config", &policy);
        index.add_word("configure", &policy);

        // `conf` is only a prefix: nothing to remove.
        assert!(!index.remove_word("conf", &policy));
        assert!(index.remove_word("config", &policy));
        assert_eq!(index.count("config"), 0);
        assert_eq!(index.count("configure"), 1);
        assert_eq!(labels(&index.find("con")), vec!["configure"]);
    }

    #[test]
    fn test_remove_prunes_nodes() {
        let policy = WordPolicy::new(1);
        let mut index = index();
        index.add_word("alpha", &policy);
        let with_alpha = index.node_count();

        index.add_word("alphabet", &policy);
        index.remove_word("alphabet", &policy);
        assert_eq!(index.node_count(), with_alpha);

        index.remove_word("alpha", &policy);
        assert_eq!(index.node_count(), 1);
        assert!(index.is_empty());
    }

    #[test]
    fn test_add_then_remove_restores_state() {
        let policy = WordPolicy::new(2);
        let mut index = index();
        for word in ["foo", "foobar", "foo", "baz", "café"] {
            index.add_word(word, &policy);
        }
        let counts = index.word_counts();
        let nodes = index.node_count();
        let found = labels(&index.find("f"));

        for word in ["fooba", "café", "qux", "foo"] {
            index.add_word(word, &policy);
            index.remove_word(word, &policy);
        }

        assert_eq!(index.word_counts(), counts);
        assert_eq!(index.node_count(), nodes);
        assert_eq!(labels(&index.find("f")), found);
    }

    #[test]
    fn test_counts_never_drop_below_one() {
        let policy = WordPolicy::new(1);
        let mut index = index();
        index.add_word("once", &policy);
        index.remove_word("once", &policy);
        assert!(!index.remove_word("once", &policy));
        assert!(index.entries().all(|e| e.count >= 1));
        assert_eq!(index.count("once"), 0);
    }

    #[test]
    fn test_fold_diacritics() {
        assert_eq!(fold_diacritics("cafe"), "cafe");
        assert!(matches!(fold_diacritics("cafe"), Cow::Borrowed(_)));
        assert_eq!(fold_diacritics("café"), "cafe");
        assert_eq!(fold_diacritics("crème brûlée"), "creme brulee");
        assert_eq!(fold_diacritics("日本語"), "日本語");
    }

    #[test]
    fn test_diacritic_variant_dual_insert() {
        let policy = WordPolicy::new(3);
        let mut index = index();
        index.add_word("café", &policy);

        let found = index.find("caf");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|e| e.label == "café" && e.count == 1));
        assert!(found.iter().any(|e| e.override_key.as_deref() == Some("cafe")));

        // The folded spelling reaches the accented word through its variant.
        let found = index.find("cafe");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "café");
        assert!(found[0].is_variant());

        // Only one counted word.
        assert_eq!(index.len(), 1);
        assert_eq!(index.word_counts().get("café"), Some(&1));
    }

    #[test]
    fn test_variant_follows_primary_lifetime() {
        let policy = WordPolicy::new(3);
        let mut index = index();
        index.add_word("café", &policy);
        index.add_word("café", &policy);
        index.add_word("cafe", &policy);

        let variant_count = |index: &WordIndex| {
            index
                .find("cafe")
                .into_iter()
                .find(|e| e.is_variant())
                .map(|e| e.count)
        };
        assert_eq!(variant_count(&index), Some(2));

        index.remove_word("café", &policy);
        assert_eq!(variant_count(&index), Some(1));
        index.remove_word("café", &policy);
        assert_eq!(variant_count(&index), None);

        // The plain word sharing the folded path is untouched.
        assert_eq!(index.count("cafe"), 1);
        assert_eq!(labels(&index.find("caf")), vec!["cafe"]);
    }
}
