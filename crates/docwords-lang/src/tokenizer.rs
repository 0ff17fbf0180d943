//! Line tokenizer and query-prefix detection.
//!
//! Tokens are the fragments between boundary matches. Empty fragments are returned as-is; the
//! index ignores them (and anything shorter than its minimum word length) on its side.

use crate::LanguageRules;

/// The prefix a completion query should search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPrefix<'a> {
    /// Text the host would consider "the word" before re-splitting.
    ///
    /// Equal to `prefix` except for languages with an unreliable host word range, where it is
    /// kept so insertion text can be rebuilt from it.
    pub raw: &'a str,
    /// Effective prefix: the final boundary-free fragment before the cursor.
    pub prefix: &'a str,
}

impl<'a> QueryPrefix<'a> {
    /// Part of `raw` preceding `prefix`.
    pub fn head(&self) -> &'a str {
        &self.raw[..self.raw.len() - self.prefix.len()]
    }
}

impl LanguageRules {
    /// Split one line into candidate words.
    pub fn tokenize<'t>(&self, language: &str, line: &'t str) -> impl Iterator<Item = &'t str> {
        self.boundary(language).split(line)
    }

    /// Split multi-line text into candidate words, line by line.
    ///
    /// Line breaks always separate words, whatever the boundary pattern says.
    pub fn tokenize_text<'t>(
        &self,
        language: &str,
        text: &'t str,
    ) -> impl Iterator<Item = &'t str> {
        let boundary = self.boundary(language);
        text.split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .flat_map(move |line| boundary.split(line))
    }

    /// Remove every boundary match from `word`.
    pub fn strip_boundaries<'w>(&self, language: &str, word: &'w str) -> std::borrow::Cow<'w, str> {
        self.boundary(language).replace_all(word, "")
    }

    /// Returns `true` if the single character `ch` is a word boundary for `language`.
    pub fn is_boundary_char(&self, language: &str, ch: char) -> bool {
        let mut buf = [0u8; 4];
        self.boundary(language).is_match(ch.encode_utf8(&mut buf))
    }

    /// Find the query prefix in `before_cursor` (the cursor line up to the cursor).
    ///
    /// Normally the prefix starts right after the last boundary character. For languages with
    /// an unreliable host word range the host would hand over the whole whitespace-delimited
    /// run instead; that run is kept as `raw` and only its final fragment is searched.
    pub fn query_prefix<'a>(&self, language: &str, before_cursor: &'a str) -> QueryPrefix<'a> {
        if self.has_unreliable_word_range(language) {
            let raw_start = before_cursor
                .char_indices()
                .rev()
                .find(|(_, ch)| ch.is_whitespace())
                .map_or(0, |(idx, ch)| idx + ch.len_utf8());
            let raw = &before_cursor[raw_start..];
            let prefix = self.tokenize(language, raw).last().unwrap_or("");
            return QueryPrefix { raw, prefix };
        }

        let start = before_cursor
            .char_indices()
            .rev()
            .find(|&(_, ch)| self.is_boundary_char(language, ch))
            .map_or(0, |(idx, ch)| idx + ch.len_utf8());
        let prefix = &before_cursor[start..];
        QueryPrefix {
            raw: prefix,
            prefix,
        }
    }
}
