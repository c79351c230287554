use std::collections::HashMap;
use std::mem;

use log::info;

use dynlist_shared::{
    is_mutation_shaped, peek_list_id, Diagnostic, ErrorReason, FetchRequest, IndexRange,
    ListEvent, ListSnapshot, LogicalClock, SourceConfig, TimerToken, UpdatePayload, Value,
};

use crate::error::{AttachError, UpdateError};
use crate::list_connection::ListConnection;
use crate::outbox::Outbox;
use crate::tokens::TokenSource;

/// Owns every list one consumer session has attached.
///
/// The provider routes inbound payloads to the right list by `listId`,
/// turns `ensure` demand into outbound fetch requests, and queues change
/// events and diagnostics for the host to drain after each call. One
/// provider per session; two sessions never share list state, even for
/// identical list identifiers.
pub struct ListProvider {
    config: SourceConfig,
    connections: HashMap<String, ListConnection>,
    tokens: TokenSource,
    outbox: Outbox,
}

impl ListProvider {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            connections: HashMap::new(),
            tokens: TokenSource::new(),
            outbox: Outbox::new(),
        }
    }

    /// Attach a list from its initial document snapshot. Nothing is
    /// registered when the snapshot is rejected; a corrected snapshot may
    /// be attached afterwards.
    pub fn attach(&mut self, snapshot: &Value) -> Result<(), AttachError> {
        match self.try_attach(snapshot) {
            Ok(list_id) => {
                info!("Attached list {list_id:?}");
                Ok(())
            }
            Err(err) => {
                self.outbox.diagnose(err.reason(), err.list_id(), err.to_string());
                Err(err)
            }
        }
    }

    /// Route one inbound payload, either a load response or a mutation
    /// batch, to the list it names.
    pub fn process_update(
        &mut self,
        payload: &Value,
        clock: &mut dyn LogicalClock,
    ) -> Result<(), UpdateError> {
        let update = match UpdatePayload::classify(payload) {
            Ok(update) => update,
            Err(err) => {
                // A mutation batch that cannot even be parsed poisons its
                // list the same way a failed apply does.
                let list_id = peek_list_id(payload);
                if is_mutation_shaped(payload) {
                    if let Some(connection) =
                        list_id.and_then(|id| self.connections.get_mut(id))
                    {
                        connection.mark_failed();
                    }
                }
                self.outbox.diagnose(err.reason(), list_id, err.to_string());
                return Err(err.into());
            }
        };
        let Some(connection) = self.connections.get_mut(update.list_id()) else {
            let list_id = update.list_id().to_string();
            self.outbox.diagnose(
                ErrorReason::InvalidListId,
                Some(&list_id),
                format!("List {list_id:?} is not attached"),
            );
            return Err(UpdateError::UnknownList { list_id });
        };
        match update {
            UpdatePayload::Load(response) => {
                connection.process_load(response, &mut self.tokens, clock, &mut self.outbox)
            }
            UpdatePayload::Mutations(batch) => {
                connection.process_mutations(batch, &mut self.tokens, clock, &mut self.outbox)
            }
        }
    }

    /// Declare the range the consumer is rendering. Returns the sub-ranges
    /// of `range` not yet materialized; fetches for them (and for the
    /// chunk-size margin around them) go to the fetch-request queue.
    pub fn ensure(
        &mut self,
        list_id: &str,
        range: IndexRange,
        clock: &mut dyn LogicalClock,
    ) -> Result<Vec<IndexRange>, UpdateError> {
        let Some(connection) = self.connections.get_mut(list_id) else {
            return Err(UpdateError::UnknownList {
                list_id: list_id.to_string(),
            });
        };
        Ok(connection.ensure(range, &mut self.tokens, clock, &mut self.outbox))
    }

    /// Deliver a due timer token. Tokens no attached list recognizes (for
    /// instance after a detach) are ignored.
    pub fn handle_timer(&mut self, timer: TimerToken, clock: &mut dyn LogicalClock) {
        for connection in self.connections.values_mut() {
            if connection.handle_timer(timer, &mut self.tokens, clock, &mut self.outbox) {
                return;
            }
        }
        info!("Timer {timer} fired for no attached list; ignored");
    }

    /// Drop materialized items of `list_id` outside `retained`, keeping
    /// whatever the consumer has visible.
    pub fn evict_outside(&mut self, list_id: &str, retained: IndexRange) -> bool {
        let Some(connection) = self.connections.get_mut(list_id) else {
            return false;
        };
        connection.evict_outside(&retained, &mut self.outbox);
        true
    }

    /// Tear a list down, disarming its timers. The identifier may be
    /// attached again from a fresh snapshot; nothing carries over.
    pub fn detach(&mut self, list_id: &str, clock: &mut dyn LogicalClock) -> bool {
        let Some(mut connection) = self.connections.remove(list_id) else {
            return false;
        };
        connection.teardown(clock);
        info!("Detached list {list_id:?}");
        true
    }

    pub fn is_attached(&self, list_id: &str) -> bool {
        self.connections.contains_key(list_id)
    }

    /// Known bounds of a list; open ends are the `ListBounds` sentinels.
    pub fn bounds(&self, list_id: &str) -> Option<(i64, i64)> {
        self.connections.get(list_id).map(|connection| {
            let bounds = connection.bounds();
            (bounds.minimum_inclusive(), bounds.maximum_exclusive())
        })
    }

    pub fn item(&self, list_id: &str, index: i64) -> Option<&Value> {
        self.connections.get(list_id)?.item(index)
    }

    /// The contiguous index range currently materialized for a list.
    pub fn materialized_range(&self, list_id: &str) -> Option<IndexRange> {
        self.connections.get(list_id).map(ListConnection::span)
    }

    pub fn current_version(&self, list_id: &str) -> Option<u64> {
        self.connections.get(list_id)?.current_version()
    }

    pub fn is_failed(&self, list_id: &str) -> Option<bool> {
        self.connections.get(list_id).map(ListConnection::is_failed)
    }

    /// Drain the outbound fetch-request queue.
    pub fn take_fetch_requests(&mut self) -> Vec<FetchRequest> {
        mem::take(&mut self.outbox.fetch_requests)
    }

    /// Drain the change events queued since the last call.
    pub fn take_events(&mut self) -> Vec<ListEvent> {
        mem::take(&mut self.outbox.events)
    }

    /// Drain the diagnostic queue, oldest first.
    pub fn pending_errors(&mut self) -> Vec<Diagnostic> {
        self.outbox.diagnostics.drain(..).collect()
    }

    fn try_attach(&mut self, snapshot: &Value) -> Result<String, AttachError> {
        let snapshot = ListSnapshot::parse(snapshot)?;
        if snapshot.source_type != self.config.source_type {
            return Err(AttachError::WrongType {
                expected: self.config.source_type.clone(),
                found: snapshot.source_type,
            });
        }
        if self.connections.contains_key(&snapshot.list_id) {
            return Err(AttachError::AlreadyAttached {
                list_id: snapshot.list_id,
            });
        }
        let end_index = snapshot.start_index + snapshot.items.len() as i64;
        let ends_ordered = match (snapshot.minimum_inclusive, snapshot.maximum_exclusive) {
            (Some(minimum), Some(maximum)) => minimum <= maximum,
            _ => true,
        };
        let fits = snapshot
            .minimum_inclusive
            .map_or(true, |minimum| minimum <= snapshot.start_index)
            && snapshot
                .maximum_exclusive
                .map_or(true, |maximum| end_index <= maximum);
        if !(ends_ordered && fits) {
            return Err(AttachError::InvalidBounds {
                list_id: snapshot.list_id,
            });
        }
        let list_id = snapshot.list_id.clone();
        self.connections
            .insert(list_id.clone(), ListConnection::new(&snapshot, &self.config));
        Ok(list_id)
    }
}

impl Default for ListProvider {
    fn default() -> Self {
        Self::new(SourceConfig::default())
    }
}
