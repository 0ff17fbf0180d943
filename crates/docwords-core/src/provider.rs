//! Completion query: collect matches from every index, merge duplicates, rank and cap them.

use crate::document::{DocumentId, HostDocument, Position};
use crate::entry::{CompletionCandidate, format_detail};
use crate::registry::{ActiveWord, IndexRegistry};
use crate::settings::CompiledSettings;
use docwords_lang::{QueryPrefix, SpecialLead};
use std::collections::{HashMap, HashSet};

/// Answers completion queries against a registry.
#[derive(Debug, Clone, Copy)]
pub struct Provider<'a> {
    registry: &'a IndexRegistry,
    settings: &'a CompiledSettings,
    active_word: &'a ActiveWord,
}

struct Merged {
    candidate: CompletionCandidate,
    documents: HashSet<DocumentId>,
}

impl<'a> Provider<'a> {
    /// Create a provider over the current engine state.
    pub fn new(
        registry: &'a IndexRegistry,
        settings: &'a CompiledSettings,
        active_word: &'a ActiveWord,
    ) -> Self {
        Self {
            registry,
            settings,
            active_word,
        }
    }

    /// Candidates for the word being typed at `position` in `doc`.
    pub fn provide(&self, doc: &dyn HostDocument, position: Position) -> Vec<CompletionCandidate> {
        let Some(line) = doc.line(position.line) else {
            return Vec::new();
        };
        let end = line
            .char_indices()
            .nth(position.character)
            .map_or(line.len(), |(idx, _)| idx);
        let language = doc.language_id();
        let query = self
            .settings
            .rules()
            .query_prefix(language, &line[..end]);
        self.provide_for(doc.id(), language, query)
    }

    /// Candidates for an already extracted query prefix.
    pub fn provide_for(
        &self,
        requesting: &DocumentId,
        language: &str,
        query: QueryPrefix<'_>,
    ) -> Vec<CompletionCandidate> {
        let prefix = query.prefix;
        if prefix.is_empty() {
            return Vec::new();
        }

        let settings = self.settings.settings();
        let mut merged: Vec<Merged> = Vec::new();
        let mut by_label: HashMap<String, usize> = HashMap::new();

        for (id, index) in self.registry.iter() {
            if id == requesting && !settings.show_current_document {
                continue;
            }
            for entry in index.find(prefix) {
                if entry.label == prefix || self.active_word.get() == Some(entry.label.as_str()) {
                    continue;
                }
                match by_label.get(&entry.label) {
                    Some(&slot) => {
                        let merged = &mut merged[slot];
                        if merged.documents.insert(entry.document.clone()) {
                            merged.candidate.count += entry.count;
                            merged
                                .candidate
                                .details
                                .push(format_detail(index.display_name(), entry.count));
                        }
                    }
                    None => {
                        by_label.insert(entry.label.clone(), merged.len());
                        merged.push(Merged {
                            candidate: CompletionCandidate::from_entry(entry, index.display_name()),
                            documents: HashSet::from([entry.document.clone()]),
                        });
                    }
                }
            }
        }

        let mut candidates: Vec<CompletionCandidate> =
            merged.into_iter().map(|m| m.candidate).collect();
        candidates.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

        if let Some(lead) = self.settings.rules().special_lead(language) {
            let rewrite = self.settings.rules().has_unreliable_word_range(language);
            candidates = with_lead_clones(candidates, lead, rewrite.then_some(&query));
        }

        if settings.max_items_count > 0 {
            candidates.truncate(settings.max_items_count);
        }
        let width = candidates.len().to_string().len();
        for (rank, candidate) in candidates.iter_mut().enumerate() {
            candidate.sort_text = Some(format!("{rank:0width$}"));
        }

        tracing::trace!(
            document = %requesting,
            prefix,
            candidates = candidates.len(),
            "completion query"
        );
        candidates
    }
}

/// Interleave a lead-prefixed clone after every candidate that does not already start with it.
fn with_lead_clones(
    candidates: Vec<CompletionCandidate>,
    lead: &SpecialLead,
    query: Option<&QueryPrefix<'_>>,
) -> Vec<CompletionCandidate> {
    let literal = lead.literal();
    let mut out = Vec::with_capacity(candidates.len() * 2);
    for candidate in candidates {
        let clone = (!candidate.label.starts_with(literal)).then(|| {
            let mut clone = candidate.clone();
            clone.label = format!("{literal}{}", candidate.label);
            clone.filter_text = candidate
                .filter_text
                .as_ref()
                .map(|key| format!("{literal}{key}"));
            if let Some(query) = query {
                let head = query.head();
                let joint = if head.ends_with(literal) { "" } else { literal };
                let text = format!("{head}{joint}{}", candidate.label);
                clone.insert_text = Some(text.clone());
                clone.filter_text = Some(text);
            }
            clone
        });
        out.push(candidate);
        out.extend(clone);
    }
    out
}
