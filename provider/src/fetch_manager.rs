use std::collections::HashMap;

use log::{info, warn};

use dynlist_shared::{
    FetchRequest, IndexRange, ListBounds, LogicalClock, LogicalTime, SourceConfig, TimerToken,
};

use crate::tokens::TokenSource;

struct PendingFetch {
    range: IndexRange,
    retries_used: usize,
    issued_at: LogicalTime,
    timer: TimerToken,
}

/// Tracks the outstanding fetch requests of one list and drives their retry
/// cycle. A request is fulfilled by a non-empty matching response; an empty
/// response or a timeout consumes one attempt, after which the range is
/// either re-requested under a fresh correlation token or given up on.
pub struct FetchManager {
    list_id: String,
    chunk_size: usize,
    fetch_retries: usize,
    fetch_timeout: LogicalTime,
    outstanding: HashMap<String, PendingFetch>,
}

/// Where a failed attempt left its range.
pub enum AttemptOutcome {
    /// Attempts remained; a fresh request went out.
    Reissued(FetchRequest),
    /// The retry budget is spent. The range stays unmaterialized until the
    /// consumer asks for it again.
    Failed(IndexRange),
    /// Bounds moved while the request was in flight and nothing of the
    /// range remains fetchable.
    Abandoned(IndexRange),
}

impl FetchManager {
    pub fn new(list_id: &str, config: &SourceConfig) -> Self {
        Self {
            list_id: list_id.to_string(),
            chunk_size: config.cache_chunk_size,
            fetch_retries: config.fetch_retries,
            fetch_timeout: config.fetch_timeout,
            outstanding: HashMap::new(),
        }
    }

    /// Chunk-granular fetch demand for a visible range: keep one chunk of
    /// margin materialized past whichever span edge the range approaches.
    /// The range above the span comes first. Ranges already in flight are
    /// not requested twice.
    pub fn demand(
        &self,
        visible: &IndexRange,
        span: &IndexRange,
        bounds: &ListBounds,
    ) -> Vec<IndexRange> {
        let wanted = bounds.clip(visible);
        if wanted.is_empty() {
            return Vec::new();
        }
        let chunk = self.chunk_size as i64;
        let mut candidates = Vec::new();
        if span.is_empty() {
            candidates.push(IndexRange::new(
                wanted.start,
                wanted.start.saturating_add(chunk),
            ));
        } else {
            if wanted.end > span.end.saturating_sub(chunk) {
                candidates.push(IndexRange::new(span.end, span.end.saturating_add(chunk)));
            }
            if wanted.start < span.start.saturating_add(chunk) {
                candidates.push(IndexRange::new(span.start.saturating_sub(chunk), span.start));
            }
        }
        candidates
            .into_iter()
            .map(|candidate| bounds.clip(&candidate))
            .filter(|range| !range.is_empty() && !self.overlaps_outstanding(range))
            .collect()
    }

    /// Emit a request for `range` and arm its timeout.
    pub fn issue(
        &mut self,
        range: IndexRange,
        tokens: &mut TokenSource,
        clock: &mut dyn LogicalClock,
    ) -> FetchRequest {
        self.issue_attempt(range, 0, tokens, clock)
    }

    pub fn is_outstanding(&self, token: &str) -> bool {
        self.outstanding.contains_key(token)
    }

    pub fn outstanding_count(&self) -> usize {
        self.outstanding.len()
    }

    pub fn owns_timer(&self, timer: TimerToken) -> bool {
        self.outstanding.values().any(|fetch| fetch.timer == timer)
    }

    /// A non-empty matching response arrived. Returns the range the token
    /// was requested for.
    pub fn resolve(&mut self, token: &str, clock: &mut dyn LogicalClock) -> Option<IndexRange> {
        let fetch = self.outstanding.remove(token)?;
        clock.cancel(fetch.timer);
        Some(fetch.range)
    }

    /// An empty response for `token` consumed one attempt.
    pub fn empty_response(
        &mut self,
        token: &str,
        bounds: &ListBounds,
        tokens: &mut TokenSource,
        clock: &mut dyn LogicalClock,
    ) -> Option<AttemptOutcome> {
        let fetch = self.outstanding.remove(token)?;
        clock.cancel(fetch.timer);
        Some(self.next_attempt(fetch, bounds, tokens, clock))
    }

    /// `timer` fired with no response; the attempt it was guarding is spent.
    pub fn timer_fired(
        &mut self,
        timer: TimerToken,
        bounds: &ListBounds,
        tokens: &mut TokenSource,
        clock: &mut dyn LogicalClock,
    ) -> Option<AttemptOutcome> {
        let token = self
            .outstanding
            .iter()
            .find(|(_, fetch)| fetch.timer == timer)
            .map(|(token, _)| token.clone())?;
        let fetch = self.outstanding.remove(&token)?;
        Some(self.next_attempt(fetch, bounds, tokens, clock))
    }

    /// Disarm every timeout; the list is going away.
    pub fn teardown(&mut self, clock: &mut dyn LogicalClock) {
        for fetch in self.outstanding.values() {
            clock.cancel(fetch.timer);
        }
        self.outstanding.clear();
    }

    fn issue_attempt(
        &mut self,
        range: IndexRange,
        retries_used: usize,
        tokens: &mut TokenSource,
        clock: &mut dyn LogicalClock,
    ) -> FetchRequest {
        let correlation_token = tokens.next_correlation();
        let timer = tokens.next_timer();
        let issued_at = clock.now();
        clock.schedule_at(issued_at + self.fetch_timeout, timer);
        self.outstanding.insert(
            correlation_token.clone(),
            PendingFetch {
                range,
                retries_used,
                issued_at,
                timer,
            },
        );
        FetchRequest {
            list_id: self.list_id.clone(),
            correlation_token,
            start_index: range.start,
            count: range.len(),
        }
    }

    fn next_attempt(
        &mut self,
        fetch: PendingFetch,
        bounds: &ListBounds,
        tokens: &mut TokenSource,
        clock: &mut dyn LogicalClock,
    ) -> AttemptOutcome {
        let wanted = bounds.clip(&fetch.range);
        if wanted.is_empty() {
            info!(
                "List {}: abandoning fetch of {}, nothing left inside {}",
                self.list_id, fetch.range, bounds
            );
            return AttemptOutcome::Abandoned(fetch.range);
        }
        if fetch.retries_used >= self.fetch_retries {
            warn!(
                "List {}: giving up on range {} after {} attempts, last issued at {}",
                self.list_id,
                wanted,
                fetch.retries_used + 1,
                fetch.issued_at
            );
            return AttemptOutcome::Failed(wanted);
        }
        AttemptOutcome::Reissued(self.issue_attempt(
            wanted,
            fetch.retries_used + 1,
            tokens,
            clock,
        ))
    }

    fn overlaps_outstanding(&self, range: &IndexRange) -> bool {
        self.outstanding
            .values()
            .any(|fetch| fetch.range.overlaps(range))
    }
}
