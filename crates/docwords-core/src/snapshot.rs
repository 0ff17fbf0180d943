//! Snapshot of the active document and the incremental diff engine.
//!
//! Hosts notify edits *after* applying them, so the text an edit replaced is gone by the time
//! the engine hears about it. The [`Snapshot`] keeps the active document's lines as they were
//! before the edit; for every change the engine widens the edited range to whole words, reads
//! the old words from the snapshot, builds the new words from the replacement text, and turns
//! the difference into `remove_word` / `add_word` calls.
//!
//! ```text
//!            activate(doc)                 edit transaction
//!   Idle ──────────────────▶ Tracking ◀──────────────────┐
//!    ▲                          │ │                       │
//!    └──────────────────────────┘ └───────────────────────┘
//!         deactivate / close
//! ```

use crate::document::{ContentChange, DocumentId, HostDocument};
use crate::registry::ActiveWord;
use crate::word_index::{WordIndex, WordPolicy};
use docwords_lang::LanguageRules;

fn byte_offset(line: &str, character: usize) -> usize {
    line.char_indices()
        .nth(character)
        .map_or(line.len(), |(idx, _)| idx)
}

/// Cached line content of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    lines: Vec<String>,
}

impl Snapshot {
    /// Read every line of `doc`.
    pub fn load(doc: &dyn HostDocument) -> Self {
        let lines = (0..doc.line_count())
            .map(|i| doc.line(i).map(|line| line.into_owned()).unwrap_or_default())
            .collect();
        Self { lines }
    }

    #[cfg(test)]
    fn from_text(text: &str) -> Self {
        Self {
            lines: split_lines(text),
        }
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line `index`, or `""` when out of range.
    pub fn line(&self, index: usize) -> &str {
        self.lines.get(index).map_or("", String::as_str)
    }

    /// All lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Work out which text `change` destroys and which text it creates, both widened to whole
    /// words.
    ///
    /// The start of the range moves left to just after the nearest boundary character of
    /// `language`; the end moves right up to the nearest whitespace. Lines strictly inside a
    /// multi-line range are included verbatim.
    pub fn word_diff(
        &self,
        change: &ContentChange,
        rules: &LanguageRules,
        language: &str,
    ) -> WordDiff {
        let range = change.range;
        let first = self.line(range.start.line);
        let last = self.line(range.end.line);

        let start = byte_offset(first, range.start.character);
        let mut end = byte_offset(last, range.end.character);
        if range.is_single_line() {
            end = end.max(start);
        }

        let word_start = first[..start]
            .char_indices()
            .rev()
            .find(|&(_, ch)| rules.is_boundary_char(language, ch))
            .map_or(0, |(idx, ch)| idx + ch.len_utf8());
        let word_end = last[end..]
            .find(char::is_whitespace)
            .map_or(last.len(), |idx| end + idx);

        let removed = if range.is_single_line() {
            first[word_start..word_end].to_string()
        } else {
            let mut text = String::from(&first[word_start..]);
            for line in range.start.line + 1..range.end.line {
                text.push('\n');
                text.push_str(self.line(line));
            }
            text.push('\n');
            text.push_str(&last[..word_end]);
            text
        };

        let mut added =
            String::with_capacity(start - word_start + change.text.len() + word_end - end);
        added.push_str(&first[word_start..start]);
        added.push_str(&change.text);
        added.push_str(&last[end..word_end]);

        WordDiff { removed, added }
    }

    /// Splice `change` into the cached lines.
    pub fn apply(&mut self, change: &ContentChange) {
        let range = change.range;
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        if range.end.line >= self.lines.len() {
            self.lines.resize(range.end.line + 1, String::new());
        }

        let first = &self.lines[range.start.line];
        let last = &self.lines[range.end.line];
        let start = byte_offset(first, range.start.character);
        let mut end = byte_offset(last, range.end.character);
        if range.is_single_line() {
            end = end.max(start);
        }

        let mut replacement = String::with_capacity(start + change.text.len() + last.len() - end);
        replacement.push_str(&first[..start]);
        replacement.push_str(&change.text);
        replacement.push_str(&last[end..]);

        self.lines
            .splice(range.start.line..=range.end.line, split_lines(&replacement));
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

/// Old and new text around one change, both widened to word boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordDiff {
    /// Text the change destroyed (read from the snapshot).
    pub removed: String,
    /// Text that replaced it.
    pub added: String,
}

impl WordDiff {
    /// Apply the diff to `index`: every removed token is un-counted, every added token counted.
    ///
    /// Each added token becomes the active word in turn.
    pub fn apply_to(
        &self,
        index: &mut WordIndex,
        rules: &LanguageRules,
        language: &str,
        policy: &WordPolicy,
        active_word: &mut ActiveWord,
    ) {
        for word in rules.tokenize_text(language, &self.removed) {
            index.remove_word(word, policy);
        }
        for word in rules.tokenize_text(language, &self.added) {
            active_word.set(word);
            index.add_word(word, policy);
        }
    }
}

/// One batch of changes delivered by a single edit notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    directly_patchable: bool,
}

impl Transaction {
    /// Open a transaction for `changes`.
    ///
    /// Only a single change confined to one line is patched in place; anything else is
    /// followed by a full snapshot reload.
    pub fn begin(changes: &[ContentChange]) -> Self {
        let directly_patchable = matches!(changes, [change] if change.range.is_single_line());
        Self { directly_patchable }
    }

    /// Returns `true` if the snapshot survives the transaction without a reload.
    pub fn is_directly_patchable(&self) -> bool {
        self.directly_patchable
    }

    /// Close the transaction. Returns `true` if the patched snapshot was kept, `false` if it was
    /// reloaded from `doc`.
    pub fn end(self, snapshot: &mut Snapshot, doc: &dyn HostDocument) -> bool {
        if !self.directly_patchable {
            *snapshot = Snapshot::load(doc);
        }
        self.directly_patchable
    }
}

/// Snapshot of the document being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedDocument {
    id: DocumentId,
    language: String,
    snapshot: Snapshot,
}

impl TrackedDocument {
    /// Document id.
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// Language the document was activated with.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Cached lines.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Run one edit transaction against `index`.
    ///
    /// Each change is diffed against the snapshot and then spliced into it, so later changes of
    /// the same batch see the text the earlier ones produced. Returns `true` if the snapshot was
    /// patched in place, `false` if it had to be reloaded from `doc`.
    pub fn apply_transaction(
        &mut self,
        doc: &dyn HostDocument,
        changes: &[ContentChange],
        index: &mut WordIndex,
        rules: &LanguageRules,
        policy: &WordPolicy,
        active_word: &mut ActiveWord,
    ) -> bool {
        let transaction = Transaction::begin(changes);
        for change in changes {
            let diff = self.snapshot.word_diff(change, rules, &self.language);
            diff.apply_to(index, rules, &self.language, policy, active_word);
            self.snapshot.apply(change);
        }
        let patched = transaction.end(&mut self.snapshot, doc);
        tracing::trace!(
            document = %self.id,
            changes = changes.len(),
            patched,
            "applied edit transaction"
        );
        patched
    }

    /// Re-read the snapshot from `doc`.
    pub fn reload(&mut self, doc: &dyn HostDocument) {
        self.language = doc.language_id().to_string();
        self.snapshot = Snapshot::load(doc);
    }
}

/// The diff engine's state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DiffState {
    /// No document is tracked.
    #[default]
    Idle,
    /// Edits to this document are diffed incrementally.
    Tracking(TrackedDocument),
}

impl DiffState {
    /// Start tracking `doc`, replacing whatever was tracked before.
    pub fn activate(&mut self, doc: &dyn HostDocument) {
        *self = DiffState::Tracking(TrackedDocument {
            id: doc.id().clone(),
            language: doc.language_id().to_string(),
            snapshot: Snapshot::load(doc),
        });
    }

    /// Stop tracking.
    pub fn deactivate(&mut self) {
        *self = DiffState::Idle;
    }

    /// Id of the tracked document.
    pub fn tracked_id(&self) -> Option<&DocumentId> {
        match self {
            DiffState::Idle => None,
            DiffState::Tracking(tracked) => Some(&tracked.id),
        }
    }

    /// Returns `true` if `id` is the tracked document.
    pub fn is_tracking(&self, id: &DocumentId) -> bool {
        self.tracked_id() == Some(id)
    }

    /// The tracked document, if it is `id`.
    pub fn tracked_mut(&mut self, id: &DocumentId) -> Option<&mut TrackedDocument> {
        match self {
            DiffState::Tracking(tracked) if &tracked.id == id => Some(tracked),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Position, TextDocument, TextRange};
    use docwords_lang::LanguageConfig;

    fn rules() -> LanguageRules {
        LanguageRules::compile(&LanguageConfig::default())
    }

    fn change(sl: usize, sc: usize, el: usize, ec: usize, text: &str) -> ContentChange {
        ContentChange::new(
            TextRange::new(Position::new(sl, sc), Position::new(el, ec)),
            text,
        )
    }

    #[test]
    fn test_diff_widens_to_word_boundaries() {
        let snapshot = Snapshot::from_text("let config = load();");
        // Typing `x` inside `config`.
        let diff = snapshot.word_diff(&change(0, 7, 0, 7, "x"), &rules(), "rust");
        assert_eq!(diff.removed, "config");
        assert_eq!(diff.added, "conxfig");
    }

    #[test]
    fn test_diff_right_edge_stops_at_whitespace_only() {
        let snapshot = Snapshot::from_text("a.b.c next");
        let diff = snapshot.word_diff(&change(0, 2, 0, 3, "B"), &rules(), "rust");
        // Left stops at the `.` boundary, right runs to the space.
        assert_eq!(diff.removed, "b.c");
        assert_eq!(diff.added, "B.c");
    }

    #[test]
    fn test_diff_deleting_a_separator_merges_words() {
        let snapshot = Snapshot::from_text("foo bar");
        let diff = snapshot.word_diff(&change(0, 3, 0, 4, ""), &rules(), "rust");
        assert_eq!(diff.removed, "foo bar");
        assert_eq!(diff.added, "foobar");
    }

    #[test]
    fn test_diff_multi_line_range() {
        let snapshot = Snapshot::from_text("alpha beta\nmiddle line\ngamma delta");
        let diff = snapshot.word_diff(&change(0, 8, 2, 2, "XY"), &rules(), "rust");
        assert_eq!(diff.removed, "beta\nmiddle line\ngamma");
        assert_eq!(diff.added, "beXYmma");
    }

    #[test]
    fn test_diff_with_multibyte_text() {
        let snapshot = Snapshot::from_text("un café noir");
        let diff = snapshot.word_diff(&change(0, 7, 0, 7, "s"), &rules(), "plaintext");
        assert_eq!(diff.removed, "café");
        assert_eq!(diff.added, "cafés");
    }

    #[test]
    fn test_apply_patches_lines() {
        let mut snapshot = Snapshot::from_text("hello world\nsecond");
        snapshot.apply(&change(0, 5, 0, 5, ",\nnew"));
        assert_eq!(snapshot.lines(), ["hello,", "new world", "second"]);

        snapshot.apply(&change(0, 6, 1, 3, ""));
        assert_eq!(snapshot.lines(), ["hello, world", "second"]);

        snapshot.apply(&change(5, 0, 5, 0, "tail"));
        assert_eq!(snapshot.line_count(), 6);
        assert_eq!(snapshot.line(5), "tail");
    }

    #[test]
    fn test_transaction_shapes() {
        let single = [change(0, 1, 0, 2, "a\nb")];
        assert!(Transaction::begin(&single).is_directly_patchable());

        let multi_line = [change(0, 1, 1, 0, "")];
        assert!(!Transaction::begin(&multi_line).is_directly_patchable());

        let two = [change(0, 0, 0, 0, "a"), change(0, 2, 0, 2, "b")];
        assert!(!Transaction::begin(&two).is_directly_patchable());
    }

    #[test]
    fn test_state_machine() {
        let doc = TextDocument::new("a", "rust", "fn main() {}");
        let mut state = DiffState::default();
        assert_eq!(state.tracked_id(), None);

        state.activate(&doc);
        assert!(state.is_tracking(doc.id()));
        assert!(state.tracked_mut(&DocumentId::new("b")).is_none());
        assert_eq!(
            state.tracked_mut(doc.id()).unwrap().snapshot().lines(),
            ["fn main() {}"]
        );

        state.deactivate();
        assert_eq!(state, DiffState::Idle);
    }
}
