use thiserror::Error;

use dynlist_shared::{ErrorReason, IndexRange, ListBounds, PayloadError};

/// Why a `process_update` call did not apply. The primary reason is carried
/// here; the full account, including partial progress, is in the drained
/// diagnostics queue.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    InvalidPayload(#[from] PayloadError),
    #[error("List {list_id:?} is not attached")]
    UnknownList { list_id: String },
    #[error("Correlation token {token:?} matches no outstanding fetch")]
    UnmatchedToken { token: String },
    #[error("Load response carried no items")]
    EmptyResponse,
    #[error("Declared bounds invert: minimum {minimum} above maximum {maximum}")]
    InvertedBounds { minimum: i64, maximum: i64 },
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error("Update requires a list version the payload did not carry")]
    MissingVersion,
    #[error("Version {version} was already applied or buffered")]
    DuplicateVersion { version: u64 },
    #[error("Buffered until version {waiting_for} arrives")]
    Deferred { waiting_for: u64 },
    #[error("Out-of-order buffer is full; version {version} dropped")]
    BufferOverflow { version: u64 },
    #[error("List is in the fail state; reload required")]
    FailState,
}

impl UpdateError {
    /// The queue reason this rejection reports. [`UpdateError::Deferred`]
    /// never reaches the queue; buffering is not a diagnostic.
    pub fn reason(&self) -> ErrorReason {
        match self {
            Self::InvalidPayload(err) => err.reason(),
            Self::UnknownList { .. } => ErrorReason::InvalidListId,
            Self::UnmatchedToken { .. }
            | Self::EmptyResponse
            | Self::InvertedBounds { .. }
            | Self::BufferOverflow { .. }
            | Self::FailState
            | Self::Deferred { .. } => ErrorReason::InternalError,
            Self::Window(err) => err.reason(),
            Self::MissingVersion => ErrorReason::MissingListVersionInSendData,
            Self::DuplicateVersion { .. } => ErrorReason::DuplicateListVersion,
        }
    }
}

/// Why the item window rejected an application.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum WindowError {
    #[error("Range {range} lies outside the declared bounds {bounds}")]
    OutOfBounds { range: IndexRange, bounds: ListBounds },
    #[error("Target {target} is outside the materialized span {span}")]
    OutOfSpan { target: IndexRange, span: IndexRange },
    #[error("Range {range} is disjoint from the materialized span {span}")]
    Disjoint { range: IndexRange, span: IndexRange },
}

impl WindowError {
    pub fn reason(&self) -> ErrorReason {
        match self {
            Self::OutOfBounds { .. } | Self::OutOfSpan { .. } => {
                ErrorReason::ListIndexOutOfRange
            }
            Self::Disjoint { .. } => ErrorReason::InternalError,
        }
    }
}

/// Why an initial snapshot was not accepted. Nothing is registered when
/// attach fails; a corrected snapshot may be attached afterwards.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum AttachError {
    #[error(transparent)]
    InvalidSnapshot(#[from] PayloadError),
    #[error("Snapshot type {found:?} does not match configured type {expected:?}")]
    WrongType { expected: String, found: String },
    #[error("List {list_id:?} is already attached")]
    AlreadyAttached { list_id: String },
    #[error("Snapshot of list {list_id:?} does not fit its declared bounds")]
    InvalidBounds { list_id: String },
}

impl AttachError {
    pub fn reason(&self) -> ErrorReason {
        match self {
            Self::InvalidSnapshot(err) => err.reason(),
            Self::WrongType { .. } | Self::AlreadyAttached { .. } | Self::InvalidBounds { .. } => {
                ErrorReason::InternalError
            }
        }
    }

    pub fn list_id(&self) -> Option<&str> {
        match self {
            Self::InvalidSnapshot(_) | Self::WrongType { .. } => None,
            Self::AlreadyAttached { list_id } | Self::InvalidBounds { list_id } => Some(list_id),
        }
    }
}
