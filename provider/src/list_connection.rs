use log::{info, warn};

use dynlist_shared::{
    ErrorReason, IndexRange, ListBounds, ListEvent, ListOperation, ListSnapshot, LoadResponse,
    LogicalClock, MutationBatch, SourceConfig, TimerToken, Value,
};

use crate::error::UpdateError;
use crate::fetch_manager::{AttemptOutcome, FetchManager};
use crate::item_window::ItemWindow;
use crate::outbox::Outbox;
use crate::tokens::TokenSource;
use crate::update_sequencer::{BufferedUpdate, GateDecision, UpdateSequencer};

/// Synchronization state of one attached list: the materialized window,
/// the outstanding fetches, and the version sequencer.
///
/// A validation failure while applying a mutation batch, or a versioning
/// disagreement on any update, leaves the list in a fail state: the window
/// keeps serving what it holds and load responses still apply, but further
/// mutation batches are refused until the consumer reloads the list.
pub struct ListConnection {
    list_id: String,
    window: ItemWindow,
    fetches: FetchManager,
    sequencer: UpdateSequencer,
    in_fail_state: bool,
}

impl ListConnection {
    pub fn new(snapshot: &ListSnapshot, config: &SourceConfig) -> Self {
        let bounds =
            ListBounds::from_declared(snapshot.minimum_inclusive, snapshot.maximum_exclusive);
        Self {
            list_id: snapshot.list_id.clone(),
            window: ItemWindow::new(bounds, snapshot.start_index, snapshot.items.clone()),
            fetches: FetchManager::new(&snapshot.list_id, config),
            sequencer: UpdateSequencer::new(config),
            in_fail_state: false,
        }
    }

    pub fn list_id(&self) -> &str {
        &self.list_id
    }

    pub fn bounds(&self) -> ListBounds {
        self.window.bounds()
    }

    pub fn span(&self) -> IndexRange {
        self.window.span()
    }

    pub fn item(&self, index: i64) -> Option<&Value> {
        self.window.item(index)
    }

    pub fn current_version(&self) -> Option<u64> {
        self.sequencer.current_version()
    }

    pub fn is_failed(&self) -> bool {
        self.in_fail_state
    }

    /// Force the fail state, for mutation batches rejected before they
    /// could be gated.
    pub fn mark_failed(&mut self) {
        self.in_fail_state = true;
    }

    /// Record the consumer's visible range, emit whatever fetches the
    /// cache demand calls for, and return the sub-ranges of `range` not
    /// yet materialized.
    pub fn ensure(
        &mut self,
        range: IndexRange,
        tokens: &mut TokenSource,
        clock: &mut dyn LogicalClock,
        outbox: &mut Outbox,
    ) -> Vec<IndexRange> {
        self.window.set_visible(range);
        let missing = self.window.missing_in(&range);
        let span = self.window.span();
        let bounds = self.window.bounds();
        for wanted in self.fetches.demand(&range, &span, &bounds) {
            let request = self.fetches.issue(wanted, tokens, clock);
            outbox.fetch_requests.push(request);
        }
        missing
    }

    pub fn process_load(
        &mut self,
        response: LoadResponse,
        tokens: &mut TokenSource,
        clock: &mut dyn LogicalClock,
        outbox: &mut Outbox,
    ) -> Result<(), UpdateError> {
        if let Some(token) = &response.correlation_token {
            if !self.fetches.is_outstanding(token) {
                outbox.diagnose(
                    ErrorReason::InternalError,
                    Some(&self.list_id),
                    format!("Correlation token {token:?} matches no outstanding fetch"),
                );
                return Err(UpdateError::UnmatchedToken {
                    token: token.clone(),
                });
            }
        }

        self.apply_declared_bounds(&response, outbox)?;

        if response.items.is_empty() {
            // Tokenless empty responses are bounds directives and are done
            // at this point; an empty response to a fetch is a failed
            // attempt.
            let Some(token) = &response.correlation_token else {
                return Ok(());
            };
            outbox.diagnose(
                ErrorReason::InternalError,
                Some(&self.list_id),
                format!("Empty response for token {token:?}"),
            );
            let bounds = self.window.bounds();
            match self.fetches.empty_response(token, &bounds, tokens, clock) {
                Some(AttemptOutcome::Reissued(request)) => {
                    outbox.diagnose(
                        ErrorReason::InternalError,
                        Some(&self.list_id),
                        format!(
                            "Retrying [{}, {}) as token {:?}",
                            request.start_index,
                            request.start_index + request.count as i64,
                            request.correlation_token
                        ),
                    );
                    outbox.fetch_requests.push(request);
                }
                Some(AttemptOutcome::Failed(range)) => {
                    warn!(
                        "List {}: range {} stays unmaterialized until re-ensured",
                        self.list_id, range
                    );
                }
                Some(AttemptOutcome::Abandoned(_)) | None => {}
            }
            return Err(UpdateError::EmptyResponse);
        }

        // A non-empty matching response fulfills its fetch no matter what
        // the items turn out to contain.
        if let Some(token) = &response.correlation_token {
            let _ = self.fetches.resolve(token, clock);
        }

        match self.sequencer.gate(response.list_version) {
            GateDecision::Unsequenced => {
                self.apply_load_items(response.start_index, response.items, outbox)?;
                self.sequencer.lock_unversioned();
                Ok(())
            }
            GateDecision::Apply(version) => {
                self.apply_load_items(response.start_index, response.items, outbox)?;
                self.sequencer.advance(version);
                self.drain_ready(clock, outbox);
                Ok(())
            }
            GateDecision::Buffer(version) => self.hold_update(
                version,
                BufferedUpdate::Load {
                    start_index: response.start_index,
                    items: response.items,
                },
                tokens,
                clock,
                outbox,
            ),
            GateDecision::Duplicate(version) => {
                outbox.diagnose(
                    ErrorReason::DuplicateListVersion,
                    Some(&self.list_id),
                    format!("Version {version} was already applied or buffered"),
                );
                Err(UpdateError::DuplicateVersion { version })
            }
            GateDecision::MissingVersion => {
                outbox.diagnose(
                    ErrorReason::MissingListVersionInSendData,
                    Some(&self.list_id),
                    "Load response and list disagree on versioning",
                );
                self.in_fail_state = true;
                Err(UpdateError::MissingVersion)
            }
        }
    }

    pub fn process_mutations(
        &mut self,
        batch: MutationBatch,
        tokens: &mut TokenSource,
        clock: &mut dyn LogicalClock,
        outbox: &mut Outbox,
    ) -> Result<(), UpdateError> {
        if self.in_fail_state {
            outbox.diagnose(
                ErrorReason::InternalError,
                Some(&self.list_id),
                "List is in the fail state; reload required",
            );
            return Err(UpdateError::FailState);
        }
        match self.sequencer.gate(batch.list_version) {
            GateDecision::Apply(version) => {
                self.apply_mutations(version, batch.operations, outbox)?;
                self.drain_ready(clock, outbox);
                Ok(())
            }
            GateDecision::Buffer(version) => self.hold_update(
                version,
                BufferedUpdate::Mutations(batch.operations),
                tokens,
                clock,
                outbox,
            ),
            GateDecision::Duplicate(version) => {
                outbox.diagnose(
                    ErrorReason::DuplicateListVersion,
                    Some(&self.list_id),
                    format!("Version {version} was already applied or buffered"),
                );
                Err(UpdateError::DuplicateVersion { version })
            }
            GateDecision::Unsequenced | GateDecision::MissingVersion => {
                outbox.diagnose(
                    ErrorReason::MissingListVersionInSendData,
                    Some(&self.list_id),
                    "Mutation batch requires a usable list version",
                );
                self.in_fail_state = true;
                Err(UpdateError::MissingVersion)
            }
        }
    }

    /// Route a due timer token to whichever side of the connection armed
    /// it. Returns false for tokens this list never armed.
    pub fn handle_timer(
        &mut self,
        timer: TimerToken,
        tokens: &mut TokenSource,
        clock: &mut dyn LogicalClock,
        outbox: &mut Outbox,
    ) -> bool {
        let bounds = self.window.bounds();
        if let Some(outcome) = self.fetches.timer_fired(timer, &bounds, tokens, clock) {
            match outcome {
                AttemptOutcome::Reissued(request) => {
                    outbox.diagnose(
                        ErrorReason::InternalError,
                        Some(&self.list_id),
                        format!(
                            "Fetch timed out; retrying as token {:?}",
                            request.correlation_token
                        ),
                    );
                    outbox.fetch_requests.push(request);
                }
                AttemptOutcome::Failed(range) => {
                    outbox.diagnose(
                        ErrorReason::InternalError,
                        Some(&self.list_id),
                        format!("Fetch of {range} failed after exhausting its retries"),
                    );
                }
                AttemptOutcome::Abandoned(_) => {}
            }
            return true;
        }
        if let Some(version) = self.sequencer.expire(timer) {
            outbox.diagnose(
                ErrorReason::MissingListVersion,
                Some(&self.list_id),
                format!(
                    "Buffered version {version} expired; version {} never arrived",
                    self.sequencer.next_version()
                ),
            );
            return true;
        }
        false
    }

    /// Host-driven housekeeping: drop materialized items outside `retained`
    /// (and outside whatever is visible).
    pub fn evict_outside(&mut self, retained: &IndexRange, outbox: &mut Outbox) {
        for range in self.window.evict_outside(retained) {
            outbox.events.push(ListEvent::Evicted {
                list_id: self.list_id.clone(),
                range,
            });
        }
    }

    /// Disarm every timer this list holds; it is being detached.
    pub fn teardown(&mut self, clock: &mut dyn LogicalClock) {
        self.fetches.teardown(clock);
        self.sequencer.teardown(clock);
    }

    fn apply_declared_bounds(
        &mut self,
        response: &LoadResponse,
        outbox: &mut Outbox,
    ) -> Result<(), UpdateError> {
        if let (Some(minimum), Some(maximum)) =
            (response.minimum_inclusive, response.maximum_exclusive)
        {
            if minimum > maximum {
                outbox.diagnose(
                    ErrorReason::InternalError,
                    Some(&self.list_id),
                    format!("Declared bounds invert: minimum {minimum} above maximum {maximum}"),
                );
                return Err(UpdateError::InvertedBounds { minimum, maximum });
            }
        }
        let outcome = self
            .window
            .reconcile_bounds(response.minimum_inclusive, response.maximum_exclusive);
        let bounds = self.window.bounds();
        if outcome.shrunk_min {
            outbox.diagnose(
                ErrorReason::InternalError,
                Some(&self.list_id),
                format!("Minimum bound rose to {}", bounds.minimum_inclusive()),
            );
        }
        if outcome.shrunk_max {
            outbox.diagnose(
                ErrorReason::InternalError,
                Some(&self.list_id),
                format!("Maximum bound fell to {}", bounds.maximum_exclusive()),
            );
        }
        for range in outcome.evicted {
            outbox.events.push(ListEvent::Evicted {
                list_id: self.list_id.clone(),
                range,
            });
        }
        if outcome.changed {
            outbox.events.push(ListEvent::BoundsChanged {
                list_id: self.list_id.clone(),
                minimum_inclusive: bounds.minimum_inclusive(),
                maximum_exclusive: bounds.maximum_exclusive(),
            });
        }
        Ok(())
    }

    fn apply_load_items(
        &mut self,
        start_index: i64,
        items: Vec<Value>,
        outbox: &mut Outbox,
    ) -> Result<(), UpdateError> {
        match self.window.apply_load(start_index, items) {
            Ok(range) => {
                if !range.is_empty() {
                    outbox.events.push(ListEvent::Loaded {
                        list_id: self.list_id.clone(),
                        range,
                    });
                }
                Ok(())
            }
            Err(err) => {
                outbox.diagnose(err.reason(), Some(&self.list_id), err.to_string());
                Err(UpdateError::Window(err))
            }
        }
    }

    fn apply_mutations(
        &mut self,
        version: u64,
        operations: Vec<ListOperation>,
        outbox: &mut Outbox,
    ) -> Result<(), UpdateError> {
        for operation in operations {
            if let Err(err) = self.apply_operation(operation, outbox) {
                // Already-applied operations from this batch stay in
                // effect; the rest never run.
                self.in_fail_state = true;
                return Err(err);
            }
        }
        self.sequencer.advance(version);
        Ok(())
    }

    fn apply_operation(
        &mut self,
        operation: ListOperation,
        outbox: &mut Outbox,
    ) -> Result<(), UpdateError> {
        let list_id = self.list_id.clone();
        let applied = match operation {
            ListOperation::Insert { index, item } => self
                .window
                .insert_at(index, vec![item])
                .map(|range| ListEvent::Inserted { list_id, range }),
            ListOperation::InsertRange { index, items } => self
                .window
                .insert_at(index, items)
                .map(|range| ListEvent::Inserted { list_id, range }),
            ListOperation::Replace { index, item } => self
                .window
                .replace_at(index, item)
                .map(|range| ListEvent::Replaced { list_id, range }),
            ListOperation::Delete { index } => self
                .window
                .delete_at(index, 1)
                .map(|range| ListEvent::Deleted { list_id, range }),
            ListOperation::DeleteRange { index, count } => self
                .window
                .delete_at(index, count as i64)
                .map(|range| ListEvent::Deleted { list_id, range }),
        };
        match applied {
            Ok(event) => {
                outbox.events.push(event);
                Ok(())
            }
            Err(err) => {
                outbox.diagnose(err.reason(), Some(&self.list_id), err.to_string());
                Err(UpdateError::Window(err))
            }
        }
    }

    fn hold_update(
        &mut self,
        version: u64,
        update: BufferedUpdate,
        tokens: &mut TokenSource,
        clock: &mut dyn LogicalClock,
        outbox: &mut Outbox,
    ) -> Result<(), UpdateError> {
        if self.sequencer.buffer(version, update, tokens, clock) {
            info!(
                "List {}: version {version} held, waiting for version {}",
                self.list_id,
                self.sequencer.next_version()
            );
            Err(UpdateError::Deferred {
                waiting_for: self.sequencer.next_version(),
            })
        } else {
            outbox.diagnose(
                ErrorReason::InternalError,
                Some(&self.list_id),
                format!("Out-of-order buffer is full; version {version} dropped"),
            );
            Err(UpdateError::BufferOverflow { version })
        }
    }

    fn drain_ready(&mut self, clock: &mut dyn LogicalClock, outbox: &mut Outbox) {
        while let Some((version, update)) = self.sequencer.pop_ready(clock) {
            let applied = match update {
                BufferedUpdate::Load { start_index, items } => self
                    .apply_load_items(start_index, items, outbox)
                    .map(|()| self.sequencer.advance(version)),
                BufferedUpdate::Mutations(operations) => {
                    self.apply_mutations(version, operations, outbox)
                }
            };
            if applied.is_err() {
                break;
            }
        }
    }
}
