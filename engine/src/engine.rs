use crate::builder;
use crate::classifier::{Classified, ItemField, LabelClassifier, Namespaces};
use crate::document::{Document, DocumentMeta};
use crate::metrics_defs::{
    DOCUMENT_GROUPS, DOCUMENT_WRITE_FAILURES, DOCUMENT_WRITES, LABELS_APPLIED, LABELS_IGNORED,
    ORPHANS_RECONCILED, RESCAN_DURATION, ROUTING_RULES_WITHOUT_HOST, UNASSIGNED_FRAGMENTS,
};
use crate::reconciler::{Merge, resolve_url_target};
use crate::sink::{DocumentSink, SinkError};
use crate::store::{Fragment, FragmentStore};
use parking_lot::Mutex;
use shared::{counter, gauge, histogram};
use std::sync::Arc;
use std::time::Instant;

/// What a label source delivers.
#[derive(Clone, Debug, PartialEq)]
pub enum LabelEvent {
    /// A complete snapshot of all live labels is about to be replayed.
    Reset,
    Label { name: String, value: String },
}

impl LabelEvent {
    pub fn label<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        LabelEvent::Label {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The label was not for us or did not parse. Nothing was written.
    Ignored,
    /// The document was rebuilt and stored.
    Stored(Summary),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Summary {
    pub groups: usize,
    pub entries: usize,
    pub merges: Vec<Merge>,
    pub unassigned: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("could not store document: {0}")]
    Sink(#[from] SinkError),
}

struct State {
    store: FragmentStore,
    meta: DocumentMeta,
    document: Document,
}

impl State {
    fn new(defaults: &DocumentMeta) -> Self {
        State {
            store: FragmentStore::new(),
            meta: defaults.clone(),
            document: Document {
                meta: defaults.clone(),
                groups: Vec::new(),
            },
        }
    }
}

/// Accumulates label updates into a dashboard document and hands every rebuilt
/// document to the sink.
///
/// All processing happens under one lock: a label update is classified,
/// applied, reconciled, rebuilt and stored before the next one is looked at,
/// and a rescan clears and replays the store without anyone observing the
/// half-cleared state.
pub struct Engine {
    classifier: LabelClassifier,
    defaults: DocumentMeta,
    state: Mutex<State>,
    sink: Arc<dyn DocumentSink + Send + Sync>,
}

impl Engine {
    pub fn new(
        namespaces: Namespaces,
        defaults: DocumentMeta,
        sink: Arc<dyn DocumentSink + Send + Sync>,
    ) -> Self {
        Engine {
            classifier: LabelClassifier::new(namespaces),
            state: Mutex::new(State::new(&defaults)),
            defaults,
            sink,
        }
    }

    pub fn handle(&self, event: LabelEvent) -> Result<Outcome, EngineError> {
        match event {
            LabelEvent::Reset => Ok(Outcome::Stored(self.reset()?)),
            LabelEvent::Label { name, value } => self.handle_label(&name, &value),
        }
    }

    /// Applies one label and, if it changed anything, rebuilds and stores the
    /// document.
    pub fn handle_label(&self, name: &str, value: &str) -> Result<Outcome, EngineError> {
        let mut state = self.state.lock();
        if !self.apply_label(&mut state, name, value) {
            return Ok(Outcome::Ignored);
        }
        let summary = self.rebuild_and_store(&mut state)?;
        Ok(Outcome::Stored(summary))
    }

    /// Clears all fragments, restores the default metadata and stores the
    /// resulting empty document, so entries of removed containers disappear
    /// even if the replay that follows carries no dashboard labels.
    pub fn reset(&self) -> Result<Summary, EngineError> {
        let mut state = self.state.lock();
        *state = State::new(&self.defaults);
        tracing::debug!("Engine state reset");
        self.rebuild_and_store(&mut state)
    }

    /// Replaces all state with the given label snapshot and stores the result
    /// once.
    pub fn rescan<I, K, V>(&self, labels: I) -> Result<Summary, EngineError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let start = Instant::now();
        let mut state = self.state.lock();
        *state = State::new(&self.defaults);

        let mut applied = 0;
        for (name, value) in labels {
            if self.apply_label(&mut state, name.as_ref(), value.as_ref()) {
                applied += 1;
            }
        }

        let result = self.rebuild_and_store(&mut state);
        histogram!(RESCAN_DURATION).record(start.elapsed().as_secs_f64());

        let summary = result?;
        tracing::info!(
            labels = applied,
            groups = summary.groups,
            entries = summary.entries,
            unassigned = summary.unassigned.len(),
            "Applied full rescan"
        );
        Ok(summary)
    }

    /// The most recently built document.
    pub fn document(&self) -> Document {
        self.state.lock().document.clone()
    }

    pub fn fragment(&self, id: &str) -> Option<Fragment> {
        self.state.lock().store.get(id).cloned()
    }

    fn apply_label(&self, state: &mut State, name: &str, value: &str) -> bool {
        let applied = match self.classifier.classify(name) {
            Classified::RoutingRule { .. } => {
                match self.classifier.translate_routing_rule(name, value) {
                    Some((label, url)) => return self.apply_label(state, &label, &url),
                    None => {
                        counter!(ROUTING_RULES_WITHOUT_HOST).increment(1);
                        false
                    }
                }
            }
            Classified::Item { id, field } => {
                let target = match field {
                    ItemField::Url => resolve_url_target(&state.store, id),
                    _ => id.to_string(),
                };
                state.store.apply_field_update(&target, &field, value);
                true
            }
            Classified::Meta(key) => {
                let applied = state.meta.set(key, value);
                if !applied {
                    tracing::debug!(label = name, value, "Ignoring invalid metadata value");
                }
                applied
            }
            Classified::GroupIcon { group } => {
                state.store.set_group_icon(group, value);
                true
            }
            Classified::Ignored => {
                if self.classifier.is_dashboard_label(name) {
                    tracing::debug!(label = name, "Ignoring malformed dashboard label");
                    counter!(LABELS_IGNORED).increment(1);
                }
                false
            }
        };

        if applied {
            counter!(LABELS_APPLIED).increment(1);
        }
        applied
    }

    fn rebuild_and_store(&self, state: &mut State) -> Result<Summary, EngineError> {
        let build = builder::build(&state.meta, &mut state.store);

        for merge in &build.merges {
            tracing::debug!(orphan = %merge.orphan, into = %merge.into, "Merged orphan fragment");
        }
        counter!(ORPHANS_RECONCILED).increment(build.merges.len() as u64);

        if !build.unassigned.is_empty() {
            tracing::debug!(
                unassigned = ?build.unassigned,
                "Fragments without a group left out of the document"
            );
        }
        gauge!(UNASSIGNED_FRAGMENTS).set(build.unassigned.len() as f64);
        gauge!(DOCUMENT_GROUPS).set(build.document.groups.len() as f64);

        let summary = Summary {
            groups: build.document.groups.len(),
            entries: build.document.groups.iter().map(|g| g.items.len()).sum(),
            merges: build.merges,
            unassigned: build.unassigned,
        };

        // The in-memory document is updated even if the sink fails below.
        state.document = build.document;

        if let Err(e) = self.sink.store(&state.document) {
            counter!(DOCUMENT_WRITE_FAILURES).increment(1);
            tracing::error!(error = %e, "Failed to store dashboard document");
            return Err(e.into());
        }
        counter!(DOCUMENT_WRITES).increment(1);

        Ok(summary)
    }
}
