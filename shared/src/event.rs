use serde::Serialize;

use crate::range::IndexRange;

/// Outbound request for one chunk of list items. The host owns delivery and
/// may serialize the request onto whatever transport it uses; the engine
/// only guarantees a fresh correlation token per emission.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchRequest {
    pub list_id: String,
    pub correlation_token: String,
    pub start_index: i64,
    pub count: usize,
}

/// Change notifications drained by the consumer after each engine call,
/// carrying the affected index range so the consumer can re-render it.
#[derive(Clone, PartialEq, Debug)]
pub enum ListEvent {
    /// Items materialized from a load response.
    Loaded { list_id: String, range: IndexRange },
    /// Items inserted by a mutation; materialized indices at and above
    /// `range.start` shifted up by `range.len()`.
    Inserted { list_id: String, range: IndexRange },
    /// Items replaced in place.
    Replaced { list_id: String, range: IndexRange },
    /// Items deleted; `range` holds the pre-deletion indices, and indices
    /// above it shifted down by `range.len()`.
    Deleted { list_id: String, range: IndexRange },
    /// Items dropped by shrunken bounds or render-window housekeeping.
    Evicted { list_id: String, range: IndexRange },
    /// Declared bounds changed.
    BoundsChanged {
        list_id: String,
        minimum_inclusive: i64,
        maximum_exclusive: i64,
    },
}

impl ListEvent {
    pub fn list_id(&self) -> &str {
        match self {
            Self::Loaded { list_id, .. }
            | Self::Inserted { list_id, .. }
            | Self::Replaced { list_id, .. }
            | Self::Deleted { list_id, .. }
            | Self::Evicted { list_id, .. }
            | Self::BoundsChanged { list_id, .. } => list_id,
        }
    }
}
