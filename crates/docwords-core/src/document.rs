//! Host document model: identities, positions, edits, and the [`HostDocument`] trait.
//!
//! All positions are expressed as `(line, character)` where `character` counts Unicode scalar
//! values (`char`s) within the line. Protocol adapters convert from their own units (e.g. LSP
//! UTF-16) before calling into the engine.

use ropey::Rope;
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Opaque, stable identifier for an open document.
///
/// Owned by the host (a URI, a buffer handle rendered as a string, ...). It is never
/// interpreted as a path: two documents may share a basename, or have no path at all.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(Arc<str>);

impl DocumentId {
    /// Create an id from any string-like key.
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    /// The underlying key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A `(line, character)` position (0-based, characters are `char`s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    /// Line index.
    pub line: usize,
    /// Character offset within the line.
    pub character: usize,
}

impl Position {
    /// Create a new position.
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// A half-open range between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    /// Inclusive start.
    pub start: Position,
    /// Exclusive end.
    pub end: Position,
}

impl TextRange {
    /// Create a range; the endpoints are swapped if given in reverse order.
    pub fn new(start: Position, end: Position) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// An empty range at `pos` (an insertion point).
    pub fn caret(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Returns `true` if the range starts and ends on the same line.
    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }
}

/// One `(range, replacement)` pair of an edit notification.
///
/// `range` refers to the document as it was before this change (but after any earlier change of
/// the same notification).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    /// Replaced range.
    pub range: TextRange,
    /// Replacement text (may contain newlines).
    pub text: String,
}

impl ContentChange {
    /// Create a change.
    pub fn new(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    /// Insert `text` at `pos`.
    pub fn insert(pos: Position, text: impl Into<String>) -> Self {
        Self::new(TextRange::caret(pos), text)
    }

    /// Delete `range`.
    pub fn delete(range: TextRange) -> Self {
        Self::new(range, String::new())
    }
}

/// Facts the engine needs from a host document.
///
/// Implementations must report the document's *current* content: edit notifications are
/// delivered after the host has applied them.
pub trait HostDocument {
    /// Stable identity.
    fn id(&self) -> &DocumentId;

    /// Language identifier (`rust`, `php`, `plaintext`, ...).
    fn language_id(&self) -> &str;

    /// Filesystem path, if the document has one.
    fn path(&self) -> Option<&Path> {
        None
    }

    /// Name shown next to suggestions coming from this document.
    fn display_name(&self) -> String {
        self.path()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.id().to_string())
    }

    /// Number of lines (an empty document has one empty line).
    fn line_count(&self) -> usize;

    /// Text of line `index`, without its line terminator.
    fn line(&self, index: usize) -> Option<Cow<'_, str>>;
}

fn trim_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// A rope-backed text document.
///
/// Protocol adapters use it as the host-side mirror of an open file; tests use it as the host.
#[derive(Debug, Clone)]
pub struct TextDocument {
    id: DocumentId,
    language_id: String,
    path: Option<PathBuf>,
    display_name: Option<String>,
    rope: Rope,
}

impl TextDocument {
    /// Create a document with the given content.
    pub fn new(id: impl Into<DocumentId>, language_id: impl Into<String>, text: &str) -> Self {
        Self {
            id: id.into(),
            language_id: language_id.into(),
            path: None,
            display_name: None,
            rope: Rope::from_str(text),
        }
    }

    /// Attach a filesystem path.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Override the display name (defaults to the file name, then the id).
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Change the language id.
    pub fn set_language_id(&mut self, language_id: impl Into<String>) {
        self.language_id = language_id.into();
    }

    /// Full text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole content.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    /// Number of characters in line `line` (excluding the terminator).
    pub fn line_len_chars(&self, line: usize) -> usize {
        self.line(line).map_or(0, |text| text.chars().count())
    }

    /// Range covering the whole document.
    pub fn full_range(&self) -> TextRange {
        let last = self.line_count().saturating_sub(1);
        TextRange::new(
            Position::new(0, 0),
            Position::new(last, self.line_len_chars(last)),
        )
    }

    fn char_offset(&self, pos: Position) -> usize {
        let last = self.rope.len_lines().saturating_sub(1);
        if pos.line > last {
            return self.rope.len_chars();
        }
        let column = pos.character.min(self.line_len_chars(pos.line));
        self.rope.line_to_char(pos.line) + column
    }

    /// Apply one change. Out-of-range positions are clamped to the document.
    pub fn apply_change(&mut self, change: &ContentChange) {
        let start = self.char_offset(change.range.start);
        let end = self.char_offset(change.range.end).max(start);
        if end > start {
            self.rope.remove(start..end);
        }
        if !change.text.is_empty() {
            self.rope.insert(start, &change.text);
        }
    }

    /// Apply changes in order.
    pub fn apply_changes<'a>(&mut self, changes: impl IntoIterator<Item = &'a ContentChange>) {
        for change in changes {
            self.apply_change(change);
        }
    }
}

impl HostDocument for TextDocument {
    fn id(&self) -> &DocumentId {
        &self.id
    }

    fn language_id(&self) -> &str {
        &self.language_id
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn display_name(&self) -> String {
        if let Some(name) = &self.display_name {
            return name.clone();
        }
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.id.to_string())
    }

    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line(&self, index: usize) -> Option<Cow<'_, str>> {
        let slice = self.rope.get_line(index)?;
        Some(match slice.as_str() {
            Some(text) => Cow::Borrowed(trim_line_ending(text)),
            None => Cow::Owned(trim_line_ending(&slice.to_string()).to_string()),
        })
    }
}
