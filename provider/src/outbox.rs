use std::collections::VecDeque;

use dynlist_shared::{Diagnostic, ErrorReason, FetchRequest, ListEvent};

/// Collects everything a processing pass produced for the host: fetch
/// requests to put on the wire, events for observers, and diagnostics for
/// the error queue. The host drains each lane when convenient.
pub struct Outbox {
    pub fetch_requests: Vec<FetchRequest>,
    pub events: Vec<ListEvent>,
    pub diagnostics: VecDeque<Diagnostic>,
}

impl Outbox {
    pub fn new() -> Self {
        Self {
            fetch_requests: Vec::new(),
            events: Vec::new(),
            diagnostics: VecDeque::new(),
        }
    }

    pub fn diagnose(&mut self, reason: ErrorReason, list_id: Option<&str>, message: impl Into<String>) {
        self.diagnostics.push_back(Diagnostic::new(reason, list_id, message));
    }
}
