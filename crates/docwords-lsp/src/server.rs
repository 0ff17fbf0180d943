//! Single-threaded stdio language server.
//!
//! The server mirrors every open document in a [`TextDocument`], forwards lifecycle
//! notifications to a [`CompletionEngine`], and answers `textDocument/completion`. Messages are
//! handled strictly in arrival order, so edits and queries never interleave.

use crate::lsp_completion::completion_list;
use crate::lsp_sync::{LspContentChange, LspPosition, apply_lsp_changes};
use crate::lsp_transport::{read_message, write_message};
use crate::lsp_uri::{file_uri_to_path, path_to_file_uri};
use docwords_core::{CompletionEngine, DocumentId, HostDocument, Settings, TextDocument};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings section read from `workspace/didChangeConfiguration`.
pub const SETTINGS_SECTION: &str = "docwords";

/// A request the server could not answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// A request arrived before `initialize`.
    #[error("server not initialized")]
    NotInitialized,
    /// A request arrived after `shutdown`.
    #[error("server is shutting down")]
    ShuttingDown,
    /// The method is not supported.
    #[error("unsupported method `{0}`")]
    MethodNotFound(String),
    /// The parameters are malformed.
    #[error("invalid params: {0}")]
    InvalidParams(String),
}

impl RequestError {
    /// JSON-RPC error code.
    pub fn code(&self) -> i64 {
        match self {
            RequestError::NotInitialized => -32002,
            RequestError::ShuttingDown => -32600,
            RequestError::MethodNotFound(_) => -32601,
            RequestError::InvalidParams(_) => -32602,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Running,
    ShuttingDown,
}

/// The language server state.
#[derive(Debug)]
pub struct Server {
    engine: CompletionEngine,
    documents: BTreeMap<DocumentId, TextDocument>,
    word_lists: Vec<TextDocument>,
    active: Option<DocumentId>,
    root: Option<PathBuf>,
    lifecycle: Lifecycle,
    exit_code: Option<i32>,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

fn text_document_uri(params: &Value) -> Option<DocumentId> {
    params
        .get("textDocument")?
        .get("uri")?
        .as_str()
        .map(DocumentId::from)
}

fn parse_settings(value: &Value) -> Result<Settings, serde_json::Error> {
    match value {
        Value::Null => Ok(Settings::default()),
        value => serde_json::from_value(value.clone()),
    }
}

fn load_word_lists(settings: &Settings) -> Vec<TextDocument> {
    settings
        .word_list_files
        .iter()
        .filter_map(|file| {
            let path = Path::new(file);
            match fs::read_to_string(path) {
                Ok(text) => Some(
                    TextDocument::new(path_to_file_uri(path), "plaintext", &text).with_path(path),
                ),
                Err(err) => {
                    tracing::warn!(file = %file, error = %err, "cannot read word list file");
                    None
                }
            }
        })
        .collect()
}

impl Server {
    /// Create a server waiting for `initialize`.
    pub fn new() -> Self {
        Self {
            engine: CompletionEngine::default(),
            documents: BTreeMap::new(),
            word_lists: Vec::new(),
            active: None,
            root: None,
            lifecycle: Lifecycle::Uninitialized,
            exit_code: None,
        }
    }

    /// The engine.
    pub fn engine(&self) -> &CompletionEngine {
        &self.engine
    }

    /// Mirror of an open document.
    pub fn document(&self, id: &DocumentId) -> Option<&TextDocument> {
        self.documents.get(id)
    }

    /// Process exit code, once `exit` was received.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Serve messages from `reader` until `exit` or end of input. Returns the exit code.
    pub fn run<R: BufRead, W: Write>(&mut self, reader: &mut R, writer: &mut W) -> io::Result<i32> {
        while let Some(message) = read_message(reader)? {
            if let Some(reply) = self.handle(&message) {
                write_message(writer, &reply)?;
            }
            if let Some(code) = self.exit_code {
                return Ok(code);
            }
        }
        tracing::info!("input closed without exit notification");
        Ok(if self.lifecycle == Lifecycle::ShuttingDown {
            0
        } else {
            1
        })
    }

    /// Handle one message. Returns the response for requests.
    pub fn handle(&mut self, message: &Value) -> Option<Value> {
        let method = message.get("method").and_then(Value::as_str)?;
        let params = message.get("params").unwrap_or(&Value::Null);

        let Some(id) = message.get("id") else {
            self.handle_notification(method, params);
            return None;
        };

        let result = self.handle_request(method, params);
        tracing::trace!(method, ok = result.is_ok(), "handled request");
        Some(match result {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err(err) => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": err.code(), "message": err.to_string() },
            }),
        })
    }

    fn handle_request(&mut self, method: &str, params: &Value) -> Result<Value, RequestError> {
        match (self.lifecycle, method) {
            (Lifecycle::Uninitialized, "initialize") => Ok(self.initialize(params)),
            (Lifecycle::Uninitialized, _) => Err(RequestError::NotInitialized),
            (Lifecycle::ShuttingDown, _) => Err(RequestError::ShuttingDown),
            (Lifecycle::Running, "shutdown") => {
                self.lifecycle = Lifecycle::ShuttingDown;
                Ok(Value::Null)
            }
            (Lifecycle::Running, "textDocument/completion") => self.completion(params),
            (Lifecycle::Running, method) => Err(RequestError::MethodNotFound(method.to_string())),
        }
    }

    fn handle_notification(&mut self, method: &str, params: &Value) {
        if method == "exit" {
            self.exit_code = Some(if self.lifecycle == Lifecycle::ShuttingDown {
                0
            } else {
                1
            });
            return;
        }
        if self.lifecycle != Lifecycle::Running {
            tracing::debug!(method, "dropping notification outside of running state");
            return;
        }
        match method {
            "initialized" => {}
            "textDocument/didOpen" => self.did_open(params),
            "textDocument/didChange" => self.did_change(params),
            "textDocument/didSave" => self.did_save(params),
            "textDocument/didClose" => self.did_close(params),
            "workspace/didChangeConfiguration" => self.did_change_configuration(params),
            _ => tracing::trace!(method, "ignoring notification"),
        }
    }

    fn initialize(&mut self, params: &Value) -> Value {
        let settings = parse_settings(params.get("initializationOptions").unwrap_or(&Value::Null))
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "invalid initializationOptions, using defaults");
                Settings::default()
            });
        self.root = params
            .get("rootUri")
            .and_then(Value::as_str)
            .and_then(file_uri_to_path)
            .or_else(|| params.get("rootPath").and_then(Value::as_str).map(PathBuf::from));

        self.word_lists = load_word_lists(&settings);
        self.engine = CompletionEngine::new(settings);
        self.engine.set_workspace_root(self.root.clone());
        for doc in &self.word_lists {
            self.engine.on_document_opened(doc);
        }
        self.lifecycle = Lifecycle::Running;
        tracing::info!(root = ?self.root, word_lists = self.word_lists.len(), "initialized");

        json!({
            "capabilities": {
                "textDocumentSync": {
                    "openClose": true,
                    "change": 2,
                    "save": { "includeText": true },
                },
                "completionProvider": { "resolveProvider": false },
            },
            "serverInfo": {
                "name": "docwords-ls",
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    fn activate(&mut self, id: &DocumentId) {
        if self.active.as_ref() == Some(id) {
            return;
        }
        let doc = self.documents.get(id).map(|doc| doc as &dyn HostDocument);
        self.engine.on_active_document_changed(doc);
        self.active = Some(id.clone());
    }

    fn did_open(&mut self, params: &Value) {
        let Some(item) = params.get("textDocument") else {
            return;
        };
        let (Some(uri), Some(text)) = (
            item.get("uri").and_then(Value::as_str),
            item.get("text").and_then(Value::as_str),
        ) else {
            tracing::debug!("malformed didOpen");
            return;
        };
        let language = item
            .get("languageId")
            .and_then(Value::as_str)
            .unwrap_or("plaintext");

        let mut doc = TextDocument::new(uri, language, text);
        if let Some(path) = file_uri_to_path(uri) {
            doc = doc.with_path(path);
        }
        let id = doc.id().clone();
        self.engine.on_document_opened(&doc);
        self.documents.insert(id.clone(), doc);
        self.activate(&id);
    }

    fn did_change(&mut self, params: &Value) {
        let Some(id) = text_document_uri(params) else {
            return;
        };
        if !self.documents.contains_key(&id) {
            tracing::debug!(document = %id, "change for a document that is not open");
            return;
        }
        // Activation snapshots the mirror before the changes are applied.
        self.activate(&id);

        let changes = LspContentChange::list_from_value(
            params.get("contentChanges").unwrap_or(&Value::Null),
        );
        let Some(doc) = self.documents.get_mut(&id) else {
            return;
        };
        let applied = apply_lsp_changes(doc, &changes);
        let outcome = self.engine.on_document_edited(doc, &applied);
        tracing::trace!(document = %id, ?outcome, "applied didChange");
    }

    fn did_save(&mut self, params: &Value) {
        let Some(id) = text_document_uri(params) else {
            return;
        };
        let Some(doc) = self.documents.get_mut(&id) else {
            return;
        };
        if let Some(text) = params.get("text").and_then(Value::as_str) {
            doc.set_text(text);
        }
        self.engine.on_document_saved(doc);
    }

    fn did_close(&mut self, params: &Value) {
        let Some(id) = text_document_uri(params) else {
            return;
        };
        let Some(doc) = self.documents.remove(&id) else {
            return;
        };
        self.engine.on_document_closed(&doc);
        if self.active.as_ref() == Some(&id) {
            self.active = None;
            self.engine.on_active_document_changed(None);
        }
    }

    fn did_change_configuration(&mut self, params: &Value) {
        let raw = params.get("settings").unwrap_or(&Value::Null);
        let section = raw.get(SETTINGS_SECTION).unwrap_or(raw);
        if section.is_null() {
            return;
        }
        let settings = match parse_settings(section) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring invalid configuration");
                return;
            }
        };

        self.word_lists = load_word_lists(&settings);
        let documents: Vec<&dyn HostDocument> = self
            .word_lists
            .iter()
            .chain(self.documents.values())
            .map(|doc| doc as &dyn HostDocument)
            .collect();
        let active = self
            .active
            .as_ref()
            .and_then(|id| self.documents.get(id))
            .map(|doc| doc as &dyn HostDocument);
        self.engine
            .on_configuration_changed(settings, &documents, active);
    }

    fn completion(&self, params: &Value) -> Result<Value, RequestError> {
        let id = text_document_uri(params)
            .ok_or_else(|| RequestError::InvalidParams("missing textDocument.uri".to_string()))?;
        let position = params
            .get("position")
            .and_then(LspPosition::from_value)
            .ok_or_else(|| RequestError::InvalidParams("missing position".to_string()))?;

        let Some(doc) = self.documents.get(&id) else {
            tracing::debug!(document = %id, "completion for a document that is not open");
            return Ok(completion_list(&[]));
        };
        let candidates = self
            .engine
            .provide_completions(doc, position.to_position(doc));
        Ok(completion_list(&candidates))
    }
}
