use std::fmt;

use serde::Serialize;

/// Reason codes reported through the provider's diagnostics queue. The
/// serialized form matches the wire-level strings hosts expect.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorReason {
    /// The payload names no attached list, or no list at all.
    InvalidListId,
    /// Generic malformed payload, unmatched correlation token, buffer
    /// overflow, or an update rejected by the fail state.
    InternalError,
    /// Unknown or structurally malformed operation entry.
    InvalidOperation,
    /// Target index outside the current bounds or materialized window.
    ListIndexOutOfRange,
    /// A versioned update arrived where versioning was never established,
    /// or a required version was omitted.
    MissingListVersionInSendData,
    /// A buffered out-of-order update expired before its gap closed.
    MissingListVersion,
    /// Version already applied or already buffered.
    DuplicateListVersion,
}

impl ErrorReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidListId => "INVALID_LIST_ID",
            Self::InternalError => "INTERNAL_ERROR",
            Self::InvalidOperation => "INVALID_OPERATION",
            Self::ListIndexOutOfRange => "LIST_INDEX_OUT_OF_RANGE",
            Self::MissingListVersionInSendData => "MISSING_LIST_VERSION_IN_SEND_DATA",
            Self::MissingListVersion => "MISSING_LIST_VERSION",
            Self::DuplicateListVersion => "DUPLICATE_LIST_VERSION",
        }
    }
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in the drained-on-read diagnostics queue. Diagnostics are
/// additive: a single failed call may append several, and they are never
/// deduplicated.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub reason: ErrorReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(reason: ErrorReason, list_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            reason,
            list_id: list_id.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.list_id {
            Some(list_id) => write!(f, "{} ({}): {}", self.reason, list_id, self.message),
            None => write!(f, "{}: {}", self.reason, self.message),
        }
    }
}
