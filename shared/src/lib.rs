//! # Dynlist Shared
//! Protocol types and primitives shared between the dynlist provider and
//! list hosts: index ranges and bounds, the payload model, the logical
//! clock, configuration, events, and the diagnostic taxonomy.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod bounds;
mod clock;
mod config;
mod error;
mod event;
mod payload;
mod range;

pub use bounds::{BoundsUpdate, ListBounds};
pub use clock::{LogicalClock, LogicalTime, StepClock, TimerToken};
pub use config::SourceConfig;
pub use error::{Diagnostic, ErrorReason};
pub use event::{FetchRequest, ListEvent};
pub use payload::{
    is_mutation_shaped, peek_list_id, ListOperation, ListSnapshot, LoadResponse, MutationBatch,
    PayloadError, UpdatePayload,
};
pub use range::IndexRange;

/// Item payloads and inbound update payloads are plain tagged values; the
/// engine treats them as opaque and never mutates one it holds.
pub use serde_json::Value;
