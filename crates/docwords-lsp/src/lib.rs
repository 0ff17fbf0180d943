#![warn(missing_docs)]
//! `docwords-lsp` - LSP adapter for `docwords-core`.
//!
//! This crate contains the LSP-specific glue (UTF-16 coordinate conversion, `didChange`
//! parsing, JSON-RPC stdio framing, `CompletionItem` building) and a small single-threaded
//! language server that drives a `docwords_core::CompletionEngine`.

pub mod lsp_completion;
pub mod lsp_sync;
pub mod lsp_transport;
pub mod lsp_uri;
pub mod server;

pub use lsp_completion::{COMPLETION_KIND_TEXT, completion_item, completion_list};
pub use lsp_sync::{
    LspContentChange, LspCoordinateConverter, LspPosition, LspRange, apply_lsp_changes,
};
pub use lsp_transport::{read_message, write_message};
pub use lsp_uri::{file_uri_to_path, path_to_file_uri, percent_decode, percent_encode};
pub use server::{RequestError, SETTINGS_SECTION, Server};
