use std::collections::BTreeMap;

use dynlist_shared::{ListOperation, LogicalClock, LogicalTime, SourceConfig, TimerToken, Value};

use crate::tokens::TokenSource;

/// Versioning discipline of one list. A list starts fresh and is locked
/// into one discipline by the first update it accepts: versioned traffic
/// sequences from 1, versionless traffic stays versionless for the life of
/// the list.
enum VersionMode {
    Fresh,
    Unversioned,
    Versioned(u64),
}

/// An update held back because earlier versions have not applied yet.
pub enum BufferedUpdate {
    Load { start_index: i64, items: Vec<Value> },
    Mutations(Vec<ListOperation>),
}

struct BufferedEntry {
    update: BufferedUpdate,
    timer: TimerToken,
}

/// What the version gate decided for an inbound update.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GateDecision {
    /// No version given and none required; apply outside the sequence.
    Unsequenced,
    /// Exactly the next version; apply now.
    Apply(u64),
    /// Ahead of the next version; hold until the gap closes.
    Buffer(u64),
    /// At or behind the current version, or already held.
    Duplicate(u64),
    /// The discipline requires a version the update lacks, or forbids the
    /// one it carries.
    MissingVersion,
}

/// Orders versioned updates for one list: admits exactly the next version,
/// holds a bounded number of updates that ran ahead, and expires held
/// entries whose gap never closes.
pub struct UpdateSequencer {
    mode: VersionMode,
    buffered: BTreeMap<u64, BufferedEntry>,
    capacity: usize,
    expiry_timeout: LogicalTime,
}

impl UpdateSequencer {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            mode: VersionMode::Fresh,
            buffered: BTreeMap::new(),
            capacity: config.list_update_buffer_size,
            expiry_timeout: config.cache_expiry_timeout,
        }
    }

    pub fn gate(&self, version: Option<u64>) -> GateDecision {
        match (version, &self.mode) {
            (None, VersionMode::Fresh | VersionMode::Unversioned) => GateDecision::Unsequenced,
            (None, VersionMode::Versioned(_)) => GateDecision::MissingVersion,
            (Some(_), VersionMode::Unversioned) => GateDecision::MissingVersion,
            (Some(version), _) => {
                let current = self.current_version().unwrap_or(0);
                if version == current + 1 {
                    GateDecision::Apply(version)
                } else if version <= current || self.buffered.contains_key(&version) {
                    GateDecision::Duplicate(version)
                } else {
                    GateDecision::Buffer(version)
                }
            }
        }
    }

    pub fn current_version(&self) -> Option<u64> {
        match self.mode {
            VersionMode::Versioned(version) => Some(version),
            VersionMode::Fresh | VersionMode::Unversioned => None,
        }
    }

    /// The version the sequence admits next.
    pub fn next_version(&self) -> u64 {
        self.current_version().unwrap_or(0) + 1
    }

    pub fn buffered_count(&self) -> usize {
        self.buffered.len()
    }

    /// A versionless update applied; versioned traffic is locked out from
    /// here on.
    pub fn lock_unversioned(&mut self) {
        if matches!(self.mode, VersionMode::Fresh) {
            self.mode = VersionMode::Unversioned;
        }
    }

    pub fn advance(&mut self, version: u64) {
        self.mode = VersionMode::Versioned(version);
    }

    /// Hold `update` until the versions before it apply, arming its expiry.
    /// Fails when the buffer is at capacity, dropping the update.
    pub fn buffer(
        &mut self,
        version: u64,
        update: BufferedUpdate,
        tokens: &mut TokenSource,
        clock: &mut dyn LogicalClock,
    ) -> bool {
        if self.buffered.len() >= self.capacity {
            return false;
        }
        let timer = tokens.next_timer();
        clock.schedule_at(clock.now() + self.expiry_timeout, timer);
        self.buffered.insert(version, BufferedEntry { update, timer });
        true
    }

    /// Remove and return the held update that now continues the sequence,
    /// if any.
    pub fn pop_ready(&mut self, clock: &mut dyn LogicalClock) -> Option<(u64, BufferedUpdate)> {
        let next = self.next_version();
        let entry = self.buffered.remove(&next)?;
        clock.cancel(entry.timer);
        Some((next, entry.update))
    }

    /// Drop the held entry whose expiry `timer` fired. Returns its version;
    /// `None` when the timer belongs to no held entry.
    pub fn expire(&mut self, timer: TimerToken) -> Option<u64> {
        let version = self
            .buffered
            .iter()
            .find(|(_, entry)| entry.timer == timer)
            .map(|(version, _)| *version)?;
        self.buffered.remove(&version);
        Some(version)
    }

    /// Disarm every expiry timer; the list is going away.
    pub fn teardown(&mut self, clock: &mut dyn LogicalClock) {
        for entry in self.buffered.values() {
            clock.cancel(entry.timer);
        }
        self.buffered.clear();
    }
}
