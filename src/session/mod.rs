//! Per-document analysis sessions.
//!
//! The host hands the core "document changed" events; each change triggers a
//! full rebuild. A rebuild must be supersedable: when a newer change arrives
//! before an older rebuild is published, the older result is discarded and
//! never becomes visible - consumers only ever observe the most recent
//! completed snapshot. Snapshots are immutable `Arc`s swapped by single
//! assignment, so no locking is involved.
//!
//! Sessions live in a [`SessionStore`] keyed by document identity with an
//! explicit open/rebuild/close lifecycle, instead of module-level state.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::analysis::{analyze_with, Analysis, AnalysisOptions};
use crate::document::Node;

/// Proof that a rebuild was started at a particular revision.
///
/// Deliberately neither `Clone` nor `Copy`: a ticket is consumed by the one
/// publish it authorizes.
#[derive(Debug)]
pub struct RebuildTicket {
    revision: u64,
}

impl RebuildTicket {
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// Analysis state for one open document.
pub struct DocumentSession {
    key: String,
    revision: u64,
    snapshot: Option<Arc<Analysis>>,
    options: AnalysisOptions,
}

impl DocumentSession {
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_options(key, AnalysisOptions::default())
    }

    pub fn with_options(key: impl Into<String>, options: AnalysisOptions) -> Self {
        Self {
            key: key.into(),
            revision: 0,
            snapshot: None,
            options,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The most recently published snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<Analysis>> {
        self.snapshot.clone()
    }

    /// Register a document change. Bumps the revision, which invalidates
    /// every outstanding ticket.
    pub fn begin_rebuild(&mut self) -> RebuildTicket {
        self.revision += 1;
        RebuildTicket {
            revision: self.revision,
        }
    }

    /// Publish a completed analysis. Returns false - and drops the result -
    /// when a newer rebuild began after this ticket was issued.
    pub fn publish(&mut self, ticket: RebuildTicket, analysis: Analysis) -> bool {
        self.publish_arc(ticket, Arc::new(analysis))
    }

    fn publish_arc(&mut self, ticket: RebuildTicket, analysis: Arc<Analysis>) -> bool {
        if ticket.revision != self.revision {
            debug!(
                key = %self.key,
                stale = ticket.revision,
                current = self.revision,
                "rebuild superseded, result dropped"
            );
            return false;
        }
        self.snapshot = Some(analysis);
        debug!(key = %self.key, revision = self.revision, "snapshot published");
        true
    }

    /// Begin, analyze and publish in one synchronous call.
    pub fn rebuild(&mut self, tree: &Node) -> Arc<Analysis> {
        let ticket = self.begin_rebuild();
        let analysis = Arc::new(analyze_with(tree, &self.options));
        self.publish_arc(ticket, Arc::clone(&analysis));
        analysis
    }
}

/// Table of sessions keyed by document identity.
#[derive(Default)]
pub struct SessionStore {
    sessions: HashMap<String, DocumentSession>,
    options: AnalysisOptions,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_options(AnalysisOptions::default())
    }

    pub fn with_options(options: AnalysisOptions) -> Self {
        Self {
            sessions: HashMap::new(),
            options,
        }
    }

    /// Session for a document, created on first use.
    pub fn open(&mut self, key: &str) -> &mut DocumentSession {
        self.sessions
            .entry(key.to_string())
            .or_insert_with(|| DocumentSession::with_options(key, self.options))
    }

    /// Rebuild a document's analysis and publish the snapshot.
    pub fn rebuild(&mut self, key: &str, tree: &Node) -> Arc<Analysis> {
        self.open(key).rebuild(tree)
    }

    pub fn snapshot(&self, key: &str) -> Option<Arc<Analysis>> {
        self.sessions.get(key).and_then(DocumentSession::snapshot)
    }

    /// Dispose of a document's session. Returns false when it was never open.
    pub fn close(&mut self, key: &str) -> bool {
        let removed = self.sessions.remove(key).is_some();
        if removed {
            debug!(key, "session closed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::from_json;
    use serde_json::json;

    fn minimal_tree() -> Node {
        from_json(&json!({
            "arazzo": "1.0.0",
            "info": {"title": "t", "version": "1.0.0"},
            "sourceDescriptions": [{"name": "s", "url": "./s.yaml"}],
            "workflows": [{
                "workflowId": "w",
                "steps": [{"stepId": "a", "operationId": "opA"}]
            }]
        }))
    }

    #[test]
    fn test_rebuild_publishes_snapshot() {
        let mut store = SessionStore::new();
        let analysis = store.rebuild("doc-1", &minimal_tree());
        assert!(!analysis.has_errors());
        assert!(store.snapshot("doc-1").is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_superseded_rebuild_is_dropped() {
        let mut session = DocumentSession::new("doc-1");
        let tree = minimal_tree();

        let stale = session.begin_rebuild();
        let newer = session.rebuild(&tree);

        // The older rebuild completes late; its result must not be published.
        let stale_analysis = crate::analysis::analyze(&from_json(&json!({})));
        assert!(!session.publish(stale, stale_analysis));

        let visible = session.snapshot().unwrap();
        assert!(Arc::ptr_eq(&visible, &newer));
    }

    #[test]
    fn test_ticket_matches_current_revision() {
        let mut session = DocumentSession::new("doc-1");
        let ticket = session.begin_rebuild();
        assert_eq!(ticket.revision(), session.revision());

        let analysis = crate::analysis::analyze(&minimal_tree());
        assert!(session.publish(ticket, analysis));
    }

    #[test]
    fn test_close_disposes_session() {
        let mut store = SessionStore::new();
        store.rebuild("doc-1", &minimal_tree());
        assert!(store.close("doc-1"));
        assert!(!store.close("doc-1"));
        assert!(store.snapshot("doc-1").is_none());
        assert!(store.is_empty());
    }
}
