//! LSP Sync Layer
//!
//! Converts LSP positions (UTF-16 code units) to the engine's character positions, and parses
//! `textDocument/didChange` content changes.

use docwords_core::{ContentChange, HostDocument, Position, TextDocument, TextRange};
use serde_json::Value;

/// LSP Position (based on UTF-16 code units)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LspPosition {
    /// Line number (0-based)
    pub line: u32,
    /// Character offset (UTF-16 code units, 0-based)
    pub character: u32,
}

impl LspPosition {
    /// Create a new LSP position (UTF-16 based).
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Parse `{ "line": .., "character": .. }`.
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            line: u32::try_from(value.get("line")?.as_u64()?).ok()?,
            character: u32::try_from(value.get("character")?.as_u64()?).ok()?,
        })
    }

    /// Convert to a character position using the text of `doc`.
    ///
    /// Positions past the last line clamp to the end of the document.
    pub fn to_position(self, doc: &dyn HostDocument) -> Position {
        let line = self.line as usize;
        match doc.line(line) {
            Some(text) => Position::new(
                line,
                LspCoordinateConverter::utf16_to_char_offset(&text, self.character as usize),
            ),
            None => {
                let last = doc.line_count().saturating_sub(1);
                let len = doc.line(last).map_or(0, |text| text.chars().count());
                Position::new(last, len)
            }
        }
    }
}

/// LSP Range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LspRange {
    /// Range start position (inclusive).
    pub start: LspPosition,
    /// Range end position (exclusive).
    pub end: LspPosition,
}

impl LspRange {
    /// Create a new LSP range.
    pub fn new(start: LspPosition, end: LspPosition) -> Self {
        Self { start, end }
    }

    /// Parse `{ "start": .., "end": .. }`.
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(Self::new(
            LspPosition::from_value(value.get("start")?)?,
            LspPosition::from_value(value.get("end")?)?,
        ))
    }

    /// Convert to a character range using the text of `doc`.
    pub fn to_range(self, doc: &dyn HostDocument) -> TextRange {
        TextRange::new(self.start.to_position(doc), self.end.to_position(doc))
    }
}

/// UTF-16 -> character offset conversion within one line.
pub struct LspCoordinateConverter;

impl LspCoordinateConverter {
    /// Convert UTF-16 code unit offset to character offset
    ///
    /// An offset pointing into the middle of a surrogate pair rounds up to the next character.
    pub fn utf16_to_char_offset(text: &str, utf16_offset: usize) -> usize {
        let mut units = 0;
        let mut chars = 0;
        for ch in text.chars() {
            if units >= utf16_offset {
                break;
            }
            units += ch.len_utf16();
            chars += 1;
        }
        chars
    }
}

/// One entry of `DidChangeTextDocumentParams.contentChanges`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LspContentChange {
    /// Replace `range` with `text`.
    Incremental {
        /// Edited range, in UTF-16 coordinates of the document before this change.
        range: LspRange,
        /// Replacement text.
        text: String,
    },
    /// Replace the whole document.
    Full {
        /// New content.
        text: String,
    },
}

impl LspContentChange {
    /// Parse one content change. Returns `None` when `text` is missing or the range is malformed.
    pub fn from_value(value: &Value) -> Option<Self> {
        let text = value.get("text")?.as_str()?.to_string();
        match value.get("range") {
            None | Some(Value::Null) => Some(Self::Full { text }),
            Some(range) => Some(Self::Incremental {
                range: LspRange::from_value(range)?,
                text,
            }),
        }
    }

    /// Parse a `contentChanges` array, dropping malformed entries.
    pub fn list_from_value(value: &Value) -> Vec<Self> {
        value
            .as_array()
            .map(|changes| changes.iter().filter_map(Self::from_value).collect())
            .unwrap_or_default()
    }

    /// Resolve against `doc` (the document as it is right before this change).
    pub fn to_content_change(&self, doc: &TextDocument) -> ContentChange {
        match self {
            Self::Incremental { range, text } => {
                ContentChange::new(range.to_range(doc), text.clone())
            }
            Self::Full { text } => ContentChange::new(doc.full_range(), text.clone()),
        }
    }
}

/// Apply LSP changes to `doc` in order, returning them in engine coordinates.
///
/// Each change is resolved against the document state the previous change produced, which is
/// how LSP defines a batch of incremental changes.
pub fn apply_lsp_changes(
    doc: &mut TextDocument,
    changes: &[LspContentChange],
) -> Vec<ContentChange> {
    changes
        .iter()
        .map(|change| {
            let change = change.to_content_change(doc);
            doc.apply_change(&change);
            change
        })
        .collect()
}
