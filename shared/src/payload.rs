use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::ErrorReason;

const TYPE: &str = "type";
const LIST_ID: &str = "listId";
const LIST_VERSION: &str = "listVersion";
const CORRELATION_TOKEN: &str = "correlationToken";
const TOKEN: &str = "token";
const START_INDEX: &str = "startIndex";
const MINIMUM_INCLUSIVE_INDEX: &str = "minimumInclusiveIndex";
const MAXIMUM_EXCLUSIVE_INDEX: &str = "maximumExclusiveIndex";
const ITEMS: &str = "items";
const OPERATIONS: &str = "operations";
const INDEX: &str = "index";
const ITEM: &str = "item";
const COUNT: &str = "count";

const OP_INSERT: &str = "Insert";
const OP_REPLACE: &str = "Replace";
const OP_DELETE: &str = "Delete";
const OP_INSERT_RANGE: &str = "InsertRange";
const OP_DELETE_RANGE: &str = "DeleteRange";

/// Why a payload could not be turned into a typed update. Each variant maps
/// onto one queue reason via [`PayloadError::reason`].
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum PayloadError {
    #[error("Update payload is not a key/value map")]
    NotAMap,
    #[error("Update payload carries no usable listId")]
    MissingListId,
    #[error("Field {field:?} is missing or malformed")]
    MalformedField { field: &'static str },
    #[error("Operation {position} is invalid: {detail}")]
    InvalidOperation { position: usize, detail: String },
}

impl PayloadError {
    pub fn reason(&self) -> ErrorReason {
        match self {
            Self::NotAMap | Self::MalformedField { .. } => ErrorReason::InternalError,
            Self::MissingListId => ErrorReason::InvalidListId,
            Self::InvalidOperation { .. } => ErrorReason::InvalidOperation,
        }
    }
}

/// Initial document-level snapshot that attaches a list to the provider.
#[derive(Clone, PartialEq, Debug)]
pub struct ListSnapshot {
    pub source_type: String,
    pub list_id: String,
    pub start_index: i64,
    pub minimum_inclusive: Option<i64>,
    pub maximum_exclusive: Option<i64>,
    pub items: Vec<Value>,
}

impl ListSnapshot {
    pub fn parse(value: &Value) -> Result<Self, PayloadError> {
        let map = value.as_object().ok_or(PayloadError::NotAMap)?;
        let source_type = required_string(map, TYPE)?;
        let list_id = list_id(map)?;
        let start_index =
            integer_field(map, START_INDEX)?.ok_or(PayloadError::MalformedField {
                field: START_INDEX,
            })?;
        Ok(Self {
            source_type,
            list_id,
            start_index,
            minimum_inclusive: integer_field(map, MINIMUM_INCLUSIVE_INDEX)?,
            maximum_exclusive: integer_field(map, MAXIMUM_EXCLUSIVE_INDEX)?,
            items: items_field(map, ITEMS)?.unwrap_or_default(),
        })
    }
}

/// A fetched chunk, a host-directed (tokenless) update, or a bounds
/// reconciliation; anything inbound without an `operations` field.
#[derive(Clone, PartialEq, Debug)]
pub struct LoadResponse {
    pub list_id: String,
    pub correlation_token: Option<String>,
    pub list_version: Option<u64>,
    pub start_index: i64,
    pub minimum_inclusive: Option<i64>,
    pub maximum_exclusive: Option<i64>,
    pub items: Vec<Value>,
}

impl LoadResponse {
    fn parse(map: &Map<String, Value>, list_id: String) -> Result<Self, PayloadError> {
        let start_index =
            integer_field(map, START_INDEX)?.ok_or(PayloadError::MalformedField {
                field: START_INDEX,
            })?;
        Ok(Self {
            list_id,
            correlation_token: token_field(map, CORRELATION_TOKEN)
                .or_else(|| token_field(map, TOKEN)),
            list_version: version_field(map)?,
            start_index,
            minimum_inclusive: integer_field(map, MINIMUM_INCLUSIVE_INDEX)?,
            maximum_exclusive: integer_field(map, MAXIMUM_EXCLUSIVE_INDEX)?,
            items: items_field(map, ITEMS)?.unwrap_or_default(),
        })
    }
}

/// One versioned batch of list mutations, applied in array order.
#[derive(Clone, PartialEq, Debug)]
pub struct MutationBatch {
    pub list_id: String,
    pub list_version: Option<u64>,
    pub operations: Vec<ListOperation>,
}

impl MutationBatch {
    fn parse(map: &Map<String, Value>, list_id: String) -> Result<Self, PayloadError> {
        let entries = match map.get(OPERATIONS) {
            Some(Value::Array(entries)) => entries,
            Some(_) | None => {
                return Err(PayloadError::MalformedField { field: OPERATIONS });
            }
        };
        let mut operations = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            operations.push(ListOperation::parse(position, entry)?);
        }
        Ok(Self {
            list_id,
            list_version: version_field(map)?,
            operations,
        })
    }
}

/// A single list mutation. Target indices are interpreted at the moment the
/// operation is applied, after any shifts from earlier operations in the
/// same batch.
#[derive(Clone, PartialEq, Debug)]
pub enum ListOperation {
    Insert { index: i64, item: Value },
    Replace { index: i64, item: Value },
    Delete { index: i64 },
    InsertRange { index: i64, items: Vec<Value> },
    DeleteRange { index: i64, count: usize },
}

impl ListOperation {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Insert { .. } => OP_INSERT,
            Self::Replace { .. } => OP_REPLACE,
            Self::Delete { .. } => OP_DELETE,
            Self::InsertRange { .. } => OP_INSERT_RANGE,
            Self::DeleteRange { .. } => OP_DELETE_RANGE,
        }
    }

    fn parse(position: usize, entry: &Value) -> Result<Self, PayloadError> {
        let invalid = |detail: &str| PayloadError::InvalidOperation {
            position,
            detail: detail.to_string(),
        };
        let map = entry
            .as_object()
            .ok_or_else(|| invalid("entry is not a key/value map"))?;
        let op_type = map
            .get(TYPE)
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("no operation type"))?;
        let index = map
            .get(INDEX)
            .and_then(Value::as_i64)
            .ok_or_else(|| invalid("no target index"))?;

        match op_type {
            OP_INSERT | OP_REPLACE => {
                let item = map.get(ITEM).cloned().ok_or_else(|| invalid("no item"))?;
                if op_type == OP_INSERT {
                    Ok(Self::Insert { index, item })
                } else {
                    Ok(Self::Replace { index, item })
                }
            }
            OP_DELETE => Ok(Self::Delete { index }),
            OP_INSERT_RANGE => match map.get(ITEMS) {
                Some(Value::Array(items)) if !items.is_empty() => Ok(Self::InsertRange {
                    index,
                    items: items.clone(),
                }),
                Some(Value::Array(_)) => Err(invalid("empty items")),
                Some(_) => Err(PayloadError::MalformedField { field: ITEMS }),
                None => Err(invalid("no items")),
            },
            OP_DELETE_RANGE => {
                let count = map
                    .get(COUNT)
                    .and_then(Value::as_u64)
                    .filter(|count| *count > 0)
                    .ok_or_else(|| invalid("no usable count"))?;
                Ok(Self::DeleteRange {
                    index,
                    count: count as usize,
                })
            }
            unknown => Err(invalid(&format!("unknown operation type {unknown:?}"))),
        }
    }
}

/// An inbound `processUpdate` payload, classified by the presence of the
/// `operations` field.
#[derive(Clone, PartialEq, Debug)]
pub enum UpdatePayload {
    Load(LoadResponse),
    Mutations(MutationBatch),
}

impl UpdatePayload {
    pub fn classify(value: &Value) -> Result<Self, PayloadError> {
        let map = value.as_object().ok_or(PayloadError::NotAMap)?;
        let list_id = list_id(map)?;
        if map.contains_key(OPERATIONS) {
            Ok(Self::Mutations(MutationBatch::parse(map, list_id)?))
        } else {
            Ok(Self::Load(LoadResponse::parse(map, list_id)?))
        }
    }

    pub fn list_id(&self) -> &str {
        match self {
            Self::Load(load) => &load.list_id,
            Self::Mutations(batch) => &batch.list_id,
        }
    }
}

/// Best-effort listId of a payload that failed to classify, so its
/// diagnostics can still name the list.
pub fn peek_list_id(value: &Value) -> Option<&str> {
    value.get(LIST_ID).and_then(Value::as_str)
}

/// Whether a payload would classify as a mutation batch.
pub fn is_mutation_shaped(value: &Value) -> bool {
    value.get(OPERATIONS).is_some()
}

fn list_id(map: &Map<String, Value>) -> Result<String, PayloadError> {
    map.get(LIST_ID)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or(PayloadError::MissingListId)
}

fn required_string(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<String, PayloadError> {
    map.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(PayloadError::MalformedField { field })
}

fn integer_field(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<i64>, PayloadError> {
    match map.get(field) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or(PayloadError::MalformedField { field }),
    }
}

fn version_field(map: &Map<String, Value>) -> Result<Option<u64>, PayloadError> {
    match map.get(LIST_VERSION) {
        None => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or(PayloadError::MalformedField {
            field: LIST_VERSION,
        }),
    }
}

fn items_field(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<Vec<Value>>, PayloadError> {
    match map.get(field) {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items.clone())),
        Some(_) => Err(PayloadError::MalformedField { field }),
    }
}

/// Correlation tokens are opaque; hosts that echo them back as numbers are
/// tolerated.
fn token_field(map: &Map<String, Value>, field: &str) -> Option<String> {
    match map.get(field) {
        Some(Value::String(token)) => Some(token.clone()),
        Some(Value::Number(token)) => Some(token.to_string()),
        _ => None,
    }
}
