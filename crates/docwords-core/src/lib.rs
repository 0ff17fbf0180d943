#![warn(missing_docs)]
//! Docwords Core - Cross-Document Word Completion Engine
//!
//! # Overview
//!
//! `docwords-core` suggests words while typing, drawn from every open document. Each document
//! gets a prefix index of its words; edits to the active document update that index
//! incrementally, so a keystroke costs work proportional to the edit, not to the document.
//!
//! The crate is headless: a host (an editor plugin, or the LSP adapter in `docwords-lsp`)
//! implements [`HostDocument`] and forwards lifecycle events to a [`CompletionEngine`].
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  CompletionEngine (lifecycle handlers)      │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Provider (merge, rank, lead clones)        │  ← Queries
//! ├─────────────────────────────────────────────┤
//! │  Snapshot + Diff Engine                     │  ← Live edits
//! ├─────────────────────────────────────────────┤
//! │  IndexRegistry / WordIndex (trie arena)     │  ← Storage
//! ├─────────────────────────────────────────────┤
//! │  LanguageRules (docwords-lang)              │  ← Tokenizer
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use docwords_core::{CompletionEngine, Position, Settings, TextDocument};
//!
//! let mut engine = CompletionEngine::new(Settings::default());
//!
//! let lib = TextDocument::new("file:///w/lib.rs", "rust", "fn widget_factory() {}");
//! let main = TextDocument::new("file:///w/main.rs", "rust", "wid");
//! engine.on_document_opened(&lib);
//! engine.on_document_opened(&main);
//! engine.on_active_document_changed(Some(&main));
//!
//! let candidates = engine.provide_completions(&main, Position::new(0, 3));
//! assert_eq!(candidates[0].label, "widget_factory");
//! ```
//!
//! # Module Description
//!
//! - [`document`] - document ids, positions, changes, and the host document trait
//! - [`word_index`] - per-document prefix trie
//! - [`registry`] - open indices and full-document parsing
//! - [`snapshot`] - active-document snapshot and incremental diffing
//! - [`provider`] - completion queries
//! - [`settings`] - configuration
//! - [`engine`] - lifecycle handlers

pub mod document;
pub mod engine;
pub mod entry;
pub mod provider;
pub mod registry;
pub mod settings;
pub mod snapshot;
pub mod word_index;

pub use document::{ContentChange, DocumentId, HostDocument, Position, TextDocument, TextRange};
pub use engine::{CompletionEngine, EditOutcome, SkipReason};
pub use entry::{CompletionCandidate, Entry};
pub use provider::Provider;
pub use registry::{ActiveWord, IndexRegistry, parse_document};
pub use settings::{CompiledSettings, ConfigError, Settings};
pub use snapshot::{DiffState, Snapshot, TrackedDocument, Transaction, WordDiff};
pub use word_index::{WordIndex, WordPolicy, fold_diacritics};

pub use docwords_lang::{LanguageRules, QueryPrefix};
