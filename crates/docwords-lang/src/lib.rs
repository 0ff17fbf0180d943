#![warn(missing_docs)]
//! `docwords-lang` - data-driven language rules for `docwords`.
//!
//! This crate stays small: it compiles the host's per-language word boundary patterns and
//! special lead characters once, and exposes the tokenizer the index and the completion
//! provider share. It knows nothing about documents or indices.

mod rules;
mod tokenizer;

pub use rules::{DEFAULT_BOUNDARY_PATTERN, LanguageConfig, LanguageRules, RuleError, SpecialLead};
pub use tokenizer::QueryPrefix;
