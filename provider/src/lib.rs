//! # Dynlist Provider
//! The list synchronization engine: a per-session registry of list states
//! that issues chunked fetch requests with retry/timeout, applies
//! version-ordered mutation batches with out-of-order buffering, and keeps
//! one consistent window over each remotely-owned list.
//!
//! The engine performs no I/O. Hosts drain [`FetchRequest`]s and
//! [`ListEvent`]s after each call, deliver inbound payloads through
//! [`ListProvider::process_update`], and drive timeouts by advancing a
//! [`LogicalClock`] and feeding due tokens to
//! [`ListProvider::handle_timer`].

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod error;
mod fetch_manager;
mod item_window;
mod list_connection;
mod outbox;
mod provider;
mod tokens;
mod update_sequencer;

pub use error::{AttachError, UpdateError, WindowError};
pub use provider::ListProvider;

pub use dynlist_shared::{
    Diagnostic, ErrorReason, FetchRequest, IndexRange, ListBounds, ListEvent, LogicalClock,
    LogicalTime, SourceConfig, StepClock, TimerToken, Value,
};
