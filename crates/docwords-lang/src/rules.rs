//! Compiled language rules.

use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use thiserror::Error;

/// Boundary pattern used when neither the host nor a language overrides it.
pub const DEFAULT_BOUNDARY_PATTERN: &str = r"[^\w]+";

/// Language name used in diagnostics for the default boundary pattern.
const DEFAULT_LANGUAGE: &str = "<default>";

/// Raw (uncompiled) language configuration, as supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageConfig {
    /// Default word boundary pattern.
    pub default_boundary: String,
    /// Per-language word boundary overrides, keyed by language id.
    pub language_boundaries: BTreeMap<String, String>,
    /// Per-language special lead character patterns (e.g. `\$` for sigils).
    pub special_characters: BTreeMap<String, String>,
    /// Languages whose host word-range detection cannot be trusted.
    pub word_range_exceptions: Vec<String>,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default_boundary: DEFAULT_BOUNDARY_PATTERN.to_string(),
            language_boundaries: BTreeMap::new(),
            special_characters: BTreeMap::new(),
            word_range_exceptions: Vec::new(),
        }
    }
}

/// Errors found while compiling a [`LanguageConfig`].
///
/// None of these are fatal: the affected language falls back to the default rules.
#[derive(Debug, Clone, Error)]
pub enum RuleError {
    /// A boundary pattern failed to compile.
    #[error("invalid word boundary pattern for `{language}`: {source}")]
    InvalidBoundary {
        /// Language id (or `<default>`).
        language: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
    /// A special lead character pattern failed to compile.
    #[error("invalid special character pattern for `{language}`: {source}")]
    InvalidSpecialCharacter {
        /// Language id.
        language: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
    /// A special lead character pattern compiles but does not describe a literal lead.
    #[error("special character pattern `{pattern}` for `{language}` is not a literal lead")]
    NonLiteralSpecialCharacter {
        /// Language id.
        language: String,
        /// The configured pattern.
        pattern: String,
    },
}

/// A language's special lead character, reduced to the literal text that gets prepended to
/// suggestions.
#[derive(Debug, Clone)]
pub struct SpecialLead {
    literal: String,
}

impl SpecialLead {
    fn compile(language: &str, pattern: &str) -> Result<Self, RuleError> {
        let regex = Regex::new(pattern).map_err(|source| RuleError::InvalidSpecialCharacter {
            language: language.to_string(),
            source,
        })?;

        let literal = unescape_literal(pattern);
        let is_literal = !literal.is_empty()
            && regex
                .find(&literal)
                .is_some_and(|m| m.start() == 0 && m.end() == literal.len());
        if !is_literal {
            return Err(RuleError::NonLiteralSpecialCharacter {
                language: language.to_string(),
                pattern: pattern.to_string(),
            });
        }

        Ok(Self { literal })
    }

    /// Text prepended to a suggestion label (e.g. `$`).
    pub fn literal(&self) -> &str {
        &self.literal
    }
}

// `\$` -> `$`, `\@\@` -> `@@`. Escapes of alphanumerics (`\w`, `\d`) are kept verbatim so the
// literal check rejects them.
fn unescape_literal(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(next) if !next.is_alphanumeric() => out.push(next),
            Some(next) => {
                out.push('\\');
                out.push(next);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Compiled per-language rules.
///
/// Built once per configuration; every keystroke only reads from it.
#[derive(Debug, Clone)]
pub struct LanguageRules {
    pub(crate) default_boundary: Regex,
    pub(crate) boundaries: HashMap<String, Regex>,
    pub(crate) special: HashMap<String, SpecialLead>,
    pub(crate) exceptions: HashSet<String>,
    errors: Vec<RuleError>,
}

impl LanguageRules {
    /// Compile a configuration.
    ///
    /// Invalid patterns are reported once through `tracing` and kept in [`Self::errors`]; the
    /// affected language falls back to the default boundary pattern (or to no special lead).
    pub fn compile(config: &LanguageConfig) -> Self {
        let mut errors = Vec::new();

        let default_boundary = match Regex::new(&config.default_boundary) {
            Ok(regex) => regex,
            Err(source) => {
                errors.push(RuleError::InvalidBoundary {
                    language: DEFAULT_LANGUAGE.to_string(),
                    source,
                });
                Regex::new(DEFAULT_BOUNDARY_PATTERN).expect("built-in boundary pattern compiles")
            }
        };

        let mut boundaries = HashMap::new();
        for (language, pattern) in &config.language_boundaries {
            match Regex::new(pattern) {
                Ok(regex) => {
                    boundaries.insert(language.clone(), regex);
                }
                Err(source) => errors.push(RuleError::InvalidBoundary {
                    language: language.clone(),
                    source,
                }),
            }
        }

        let mut special = HashMap::new();
        for (language, pattern) in &config.special_characters {
            match SpecialLead::compile(language, pattern) {
                Ok(lead) => {
                    special.insert(language.clone(), lead);
                }
                Err(err) => errors.push(err),
            }
        }

        for err in &errors {
            tracing::warn!(error = %err, "ignoring language rule");
        }

        Self {
            default_boundary,
            boundaries,
            special,
            exceptions: config.word_range_exceptions.iter().cloned().collect(),
            errors,
        }
    }

    /// Boundary pattern for `language` (the default one when there is no valid override).
    pub fn boundary(&self, language: &str) -> &Regex {
        self.boundaries
            .get(language)
            .unwrap_or(&self.default_boundary)
    }

    /// The default boundary pattern.
    pub fn default_boundary(&self) -> &Regex {
        &self.default_boundary
    }

    /// Special lead character for `language`, if one is configured.
    pub fn special_lead(&self, language: &str) -> Option<&SpecialLead> {
        self.special.get(language)
    }

    /// Returns `true` if the host's word range for `language` must be re-split.
    pub fn has_unreliable_word_range(&self, language: &str) -> bool {
        self.exceptions.contains(language)
    }

    /// Problems found while compiling.
    pub fn errors(&self) -> &[RuleError] {
        &self.errors
    }
}

impl Default for LanguageRules {
    fn default() -> Self {
        Self::compile(&LanguageConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LanguageConfig {
        let mut config = LanguageConfig::default();
        config
            .language_boundaries
            .insert("css".to_string(), r"[^\w-]+".to_string());
        config
            .special_characters
            .insert("php".to_string(), r"\$".to_string());
        config.word_range_exceptions.push("php".to_string());
        config
    }

    #[test]
    fn test_language_override_and_fallback() {
        let rules = LanguageRules::compile(&config());
        assert_eq!(rules.boundary("css").as_str(), r"[^\w-]+");
        assert_eq!(rules.boundary("rust").as_str(), DEFAULT_BOUNDARY_PATTERN);
        assert!(rules.errors().is_empty());
    }

    #[test]
    fn test_invalid_override_falls_back_to_default() {
        let mut config = config();
        config
            .language_boundaries
            .insert("broken".to_string(), "[unclosed".to_string());
        let rules = LanguageRules::compile(&config);

        assert_eq!(rules.boundary("broken").as_str(), DEFAULT_BOUNDARY_PATTERN);
        assert_eq!(rules.errors().len(), 1);
        assert!(matches!(
            &rules.errors()[0],
            RuleError::InvalidBoundary { language, .. } if language == "broken"
        ));
    }

    #[test]
    fn test_invalid_default_uses_builtin() {
        let config = LanguageConfig {
            default_boundary: "(".to_string(),
            ..LanguageConfig::default()
        };
        let rules = LanguageRules::compile(&config);
        assert_eq!(rules.default_boundary().as_str(), DEFAULT_BOUNDARY_PATTERN);
        assert_eq!(rules.errors().len(), 1);
    }

    #[test]
    fn test_special_lead_literal() {
        let rules = LanguageRules::compile(&config());
        let lead = rules.special_lead("php").unwrap();
        assert_eq!(lead.literal(), "$");
        assert!(rules.special_lead("rust").is_none());
        assert!(rules.has_unreliable_word_range("php"));
        assert!(!rules.has_unreliable_word_range("rust"));
    }

    #[test]
    fn test_non_literal_special_lead_is_rejected() {
        let mut config = LanguageConfig::default();
        config
            .special_characters
            .insert("perl".to_string(), r"[$@%]".to_string());
        config
            .special_characters
            .insert("shell".to_string(), r"\w".to_string());
        let rules = LanguageRules::compile(&config);

        assert!(rules.special_lead("perl").is_none());
        assert!(rules.special_lead("shell").is_none());
        assert_eq!(rules.errors().len(), 2);
    }
}
