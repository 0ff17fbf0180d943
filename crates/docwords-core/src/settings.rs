//! Engine configuration.
//!
//! [`Settings`] mirrors the host's settings section field for field (camelCase keys, every key
//! optional). The engine never reads it directly: it works on [`CompiledSettings`], which holds
//! the compiled language rules, the word policy, and the file-exclusion matcher.

use crate::word_index::WordPolicy;
use docwords_lang::{DEFAULT_BOUNDARY_PATTERN, LanguageConfig, LanguageRules, RuleError};
use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Host-facing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Minimum indexable word length, in characters.
    pub min_word_length: usize,
    /// Maximum number of lines scanned when a document is parsed.
    pub max_lines: usize,
    /// Default word boundary pattern.
    pub whitespace: String,
    /// Per-language word boundary patterns.
    pub language_whitespace: BTreeMap<String, String>,
    /// Per-language special lead character patterns.
    pub language_special_characters: BTreeMap<String, String>,
    /// Languages whose host word range is re-split before searching.
    pub word_range_exception_languages: Vec<String>,
    /// Words never suggested, separated by the default boundary pattern.
    pub ignored_words: String,
    /// Maximum number of candidates per query (`0` means no cap).
    pub max_items_count: usize,
    /// Whether matches from the requesting document are included.
    pub show_current_document: bool,
    /// Rebuild indices on save only instead of tracking live edits.
    pub update_only_on_save: bool,
    /// Glob of files never indexed, matched against the root-relative path.
    pub exclude_files: String,
    /// Languages whose documents are never indexed.
    pub non_contributing_languages: Vec<String>,
    /// Dictionary files whose index survives closing them.
    pub word_list_files: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        let sigil = BTreeMap::from([
            ("php".to_string(), r"\$".to_string()),
            ("scss".to_string(), r"\$".to_string()),
        ]);
        Self {
            min_word_length: 3,
            max_lines: 9999,
            whitespace: DEFAULT_BOUNDARY_PATTERN.to_string(),
            language_whitespace: BTreeMap::new(),
            language_special_characters: sigil,
            word_range_exception_languages: vec!["php".to_string(), "scss".to_string()],
            ignored_words: String::new(),
            max_items_count: 20,
            show_current_document: true,
            update_only_on_save: false,
            exclude_files: "**/{.git,node_modules}/**".to_string(),
            non_contributing_languages: Vec::new(),
            word_list_files: Vec::new(),
        }
    }
}

impl Settings {
    /// The language part of the settings.
    pub fn language_config(&self) -> LanguageConfig {
        LanguageConfig {
            default_boundary: self.whitespace.clone(),
            language_boundaries: self.language_whitespace.clone(),
            special_characters: self.language_special_characters.clone(),
            word_range_exceptions: self.word_range_exception_languages.clone(),
        }
    }
}

/// Configuration problems. Each one is reported once, when the settings are compiled.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A language rule was rejected.
    #[error(transparent)]
    Rule(#[from] RuleError),
    /// The exclusion glob failed to compile; no file is excluded.
    #[error("invalid file exclusion glob `{pattern}`: {source}")]
    ExcludeGlob {
        /// The configured glob.
        pattern: String,
        /// Underlying glob error.
        #[source]
        source: globset::Error,
    },
}

/// Settings in the form the engine consumes.
#[derive(Debug, Clone)]
pub struct CompiledSettings {
    settings: Settings,
    rules: LanguageRules,
    policy: WordPolicy,
    exclude: Option<GlobMatcher>,
    errors: Vec<ConfigError>,
}

impl CompiledSettings {
    /// Compile `settings`. Invalid parts fall back to defaults and are kept in [`Self::errors`].
    pub fn compile(settings: Settings) -> Self {
        let rules = LanguageRules::compile(&settings.language_config());
        let mut errors: Vec<ConfigError> =
            rules.errors().iter().cloned().map(ConfigError::from).collect();

        let ignored_words: HashSet<String> = rules
            .default_boundary()
            .split(&settings.ignored_words)
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect();
        let policy = WordPolicy {
            min_word_length: settings.min_word_length,
            ignored_words,
        };

        let exclude = if settings.exclude_files.trim().is_empty() {
            None
        } else {
            match Glob::new(&settings.exclude_files) {
                Ok(glob) => Some(glob.compile_matcher()),
                Err(source) => {
                    let err = ConfigError::ExcludeGlob {
                        pattern: settings.exclude_files.clone(),
                        source,
                    };
                    tracing::warn!(error = %err, "file exclusion disabled");
                    errors.push(err);
                    None
                }
            }
        };

        Self {
            settings,
            rules,
            policy,
            exclude,
            errors,
        }
    }

    /// The raw settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Compiled language rules (the tokenizer).
    pub fn rules(&self) -> &LanguageRules {
        &self.rules
    }

    /// Which words get indexed.
    pub fn policy(&self) -> &WordPolicy {
        &self.policy
    }

    /// Problems found while compiling.
    pub fn errors(&self) -> &[ConfigError] {
        &self.errors
    }

    /// Returns `true` if `path` matches the exclusion glob.
    ///
    /// The glob is matched against `path` relative to `root` when `path` lies inside it.
    pub fn is_excluded(&self, path: &Path, root: Option<&Path>) -> bool {
        let Some(matcher) = &self.exclude else {
            return false;
        };
        let relative = root
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        matcher.is_match(relative)
    }

    /// Returns `true` if documents in `language` contribute words.
    pub fn is_contributing(&self, language: &str) -> bool {
        !self
            .settings
            .non_contributing_languages
            .iter()
            .any(|l| l == language)
    }

    /// Returns `true` if `path` is one of the configured word-list files.
    pub fn is_word_list_file(&self, path: &Path) -> bool {
        self.settings
            .word_list_files
            .iter()
            .any(|file| Path::new(file) == path)
    }
}

impl Default for CompiledSettings {
    fn default() -> Self {
        Self::compile(Settings::default())
    }
}
