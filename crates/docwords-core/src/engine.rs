//! The engine: document lifecycle handlers and the completion entry point.
//!
//! A host forwards its events to one [`CompletionEngine`]. Every handler runs to completion
//! synchronously and never fails; problems degrade to "no update" or "no suggestions" and are
//! logged through `tracing`.

use crate::document::{ContentChange, DocumentId, HostDocument, Position};
use crate::entry::CompletionCandidate;
use crate::provider::Provider;
use crate::registry::{ActiveWord, IndexRegistry, parse_document};
use crate::settings::{CompiledSettings, Settings};
use crate::snapshot::DiffState;
use std::path::PathBuf;
use thiserror::Error;

/// Why an update was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// The document has no index (excluded, or closed before the event arrived).
    #[error("document has no index")]
    NoIndex,
    /// The edit is for a document other than the one being tracked.
    #[error("document is not the tracked document")]
    NotTracked,
    /// The document matches the file exclusion glob.
    #[error("document is excluded from indexing")]
    Excluded,
    /// The document's language does not contribute words.
    #[error("document language does not contribute words")]
    NotContributing,
    /// Indices are only rebuilt on save.
    #[error("live updates are disabled")]
    SaveOnly,
}

/// What an edit notification did to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The index was updated and the snapshot patched in place.
    Patched,
    /// The index was updated and the snapshot reloaded from the document.
    Reloaded,
    /// Nothing changed.
    Skipped(SkipReason),
}

impl EditOutcome {
    /// Returns `true` if the index was updated.
    pub fn is_applied(&self) -> bool {
        !matches!(self, EditOutcome::Skipped(_))
    }
}

/// Cross-document word completion engine.
#[derive(Debug, Clone, Default)]
pub struct CompletionEngine {
    settings: CompiledSettings,
    registry: IndexRegistry,
    diff: DiffState,
    active_word: ActiveWord,
    workspace_root: Option<PathBuf>,
}

impl CompletionEngine {
    /// Create an engine with the given settings.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: CompiledSettings::compile(settings),
            ..Self::default()
        }
    }

    /// Set the root that exclusion globs are matched against.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = Some(root.into());
        self
    }

    /// Replace the workspace root.
    pub fn set_workspace_root(&mut self, root: Option<PathBuf>) {
        self.workspace_root = root;
    }

    /// Current settings.
    pub fn settings(&self) -> &CompiledSettings {
        &self.settings
    }

    /// All live indices.
    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// The word most recently typed.
    pub fn active_word(&self) -> &ActiveWord {
        &self.active_word
    }

    /// Id of the document whose edits are diffed incrementally.
    pub fn tracked_document(&self) -> Option<&DocumentId> {
        self.diff.tracked_id()
    }

    fn check_indexable(&self, doc: &dyn HostDocument) -> Result<(), SkipReason> {
        if let Some(path) = doc.path()
            && self
                .settings
                .is_excluded(path, self.workspace_root.as_deref())
        {
            return Err(SkipReason::Excluded);
        }
        if !self.settings.is_contributing(doc.language_id()) {
            return Err(SkipReason::NotContributing);
        }
        Ok(())
    }

    fn index_document(&mut self, doc: &dyn HostDocument) -> Result<(), SkipReason> {
        self.check_indexable(doc)?;
        self.registry.insert(parse_document(doc, &self.settings));
        Ok(())
    }

    /// A document was opened: index it.
    pub fn on_document_opened(&mut self, doc: &dyn HostDocument) {
        if let Err(reason) = self.index_document(doc) {
            tracing::debug!(document = %doc.id(), %reason, "not indexing opened document");
            return;
        }
        if let Some(tracked) = self.diff.tracked_mut(doc.id()) {
            tracked.reload(doc);
        }
    }

    /// A document was closed: drop its index unless it is a word-list file.
    pub fn on_document_closed(&mut self, doc: &dyn HostDocument) {
        if self.diff.is_tracking(doc.id()) {
            self.diff.deactivate();
        }
        if doc
            .path()
            .is_some_and(|path| self.settings.is_word_list_file(path))
        {
            tracing::debug!(document = %doc.id(), "keeping word list index");
            return;
        }
        if self.registry.remove(doc.id()).is_some() {
            tracing::debug!(document = %doc.id(), "dropped index");
        }
    }

    /// A document was saved: rebuild its index from scratch.
    pub fn on_document_saved(&mut self, doc: &dyn HostDocument) {
        if let Err(reason) = self.index_document(doc) {
            tracing::debug!(document = %doc.id(), %reason, "not rebuilding saved document");
            return;
        }
        if let Some(tracked) = self.diff.tracked_mut(doc.id()) {
            tracked.reload(doc);
        }
        tracing::debug!(document = %doc.id(), "rebuilt index on save");
    }

    /// A document was edited. `changes` were already applied to `doc`, in order.
    pub fn on_document_edited(
        &mut self,
        doc: &dyn HostDocument,
        changes: &[ContentChange],
    ) -> EditOutcome {
        if self.settings.settings().update_only_on_save {
            return EditOutcome::Skipped(SkipReason::SaveOnly);
        }
        let Some(index) = self.registry.get_mut(doc.id()) else {
            tracing::debug!(document = %doc.id(), "edit for a document without index");
            return EditOutcome::Skipped(SkipReason::NoIndex);
        };
        if !self.diff.is_tracking(doc.id()) {
            tracing::warn!(
                document = %doc.id(),
                tracked = ?self.diff.tracked_id(),
                "edit for a document that is not tracked, skipping"
            );
            return EditOutcome::Skipped(SkipReason::NotTracked);
        }
        let Some(tracked) = self.diff.tracked_mut(doc.id()) else {
            return EditOutcome::Skipped(SkipReason::NotTracked);
        };

        let patched = tracked.apply_transaction(
            doc,
            changes,
            index,
            self.settings.rules(),
            self.settings.policy(),
            &mut self.active_word,
        );
        if patched {
            EditOutcome::Patched
        } else {
            EditOutcome::Reloaded
        }
    }

    /// The focused document changed (`None` when nothing has focus).
    pub fn on_active_document_changed(&mut self, doc: Option<&dyn HostDocument>) {
        let Some(doc) = doc else {
            self.diff.deactivate();
            return;
        };
        if let Err(reason) = self.check_indexable(doc) {
            tracing::debug!(document = %doc.id(), %reason, "not tracking active document");
            self.diff.deactivate();
            return;
        }
        if !self.registry.contains(doc.id()) {
            self.registry.insert(parse_document(doc, &self.settings));
        }
        if self.settings.settings().update_only_on_save {
            self.diff.deactivate();
        } else if !self.diff.is_tracking(doc.id()) {
            self.diff.activate(doc);
            tracing::debug!(document = %doc.id(), "tracking active document");
        }
    }

    /// Install new settings and rebuild every index.
    ///
    /// `documents` are the open documents; `active` is re-activated afterwards.
    pub fn on_configuration_changed(
        &mut self,
        settings: Settings,
        documents: &[&dyn HostDocument],
        active: Option<&dyn HostDocument>,
    ) {
        self.settings = CompiledSettings::compile(settings);
        self.registry.clear();
        self.diff.deactivate();
        self.active_word.clear();
        for doc in documents {
            self.on_document_opened(*doc);
        }
        self.on_active_document_changed(active);
        tracing::debug!(
            documents = self.registry.len(),
            errors = self.settings.errors().len(),
            "configuration reloaded"
        );
    }

    /// Ranked suggestions for the word being typed at `position` in `doc`.
    pub fn provide_completions(
        &self,
        doc: &dyn HostDocument,
        position: Position,
    ) -> Vec<CompletionCandidate> {
        Provider::new(&self.registry, &self.settings, &self.active_word).provide(doc, position)
    }
}
