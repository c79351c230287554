use serde_json::{json, Map, Value};

/// Values `from..to`, each item being its own index. The suite tells items
/// apart by value, so loads and snapshots built this way make shifted or
/// replaced indices visible.
pub fn int_items(from: i64, to: i64) -> Vec<Value> {
    (from..to).map(|index| json!(index)).collect()
}

/// Fluent builder for initial list snapshots.
pub struct SnapshotBuilder {
    source_type: String,
    list_id: String,
    start_index: i64,
    minimum_inclusive: Option<i64>,
    maximum_exclusive: Option<i64>,
    items: Vec<Value>,
}

pub fn snapshot(list_id: &str) -> SnapshotBuilder {
    SnapshotBuilder {
        source_type: "testList".to_string(),
        list_id: list_id.to_string(),
        start_index: 0,
        minimum_inclusive: None,
        maximum_exclusive: None,
        items: Vec::new(),
    }
}

impl SnapshotBuilder {
    pub fn source_type(mut self, source_type: &str) -> Self {
        self.source_type = source_type.to_string();
        self
    }

    pub fn start_index(mut self, start_index: i64) -> Self {
        self.start_index = start_index;
        self
    }

    pub fn bounds(mut self, minimum: i64, maximum: i64) -> Self {
        self.minimum_inclusive = Some(minimum);
        self.maximum_exclusive = Some(maximum);
        self
    }

    pub fn minimum(mut self, minimum: i64) -> Self {
        self.minimum_inclusive = Some(minimum);
        self
    }

    pub fn maximum(mut self, maximum: i64) -> Self {
        self.maximum_exclusive = Some(maximum);
        self
    }

    pub fn items(mut self, items: Vec<Value>) -> Self {
        self.items = items;
        self
    }

    pub fn build(self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), json!(self.source_type));
        map.insert("listId".to_string(), json!(self.list_id));
        map.insert("startIndex".to_string(), json!(self.start_index));
        if let Some(minimum) = self.minimum_inclusive {
            map.insert("minimumInclusiveIndex".to_string(), json!(minimum));
        }
        if let Some(maximum) = self.maximum_exclusive {
            map.insert("maximumExclusiveIndex".to_string(), json!(maximum));
        }
        map.insert("items".to_string(), Value::Array(self.items));
        Value::Object(map)
    }
}

/// Fluent builder for load-response payloads, tokened or directive.
pub struct LoadResponseBuilder {
    list_id: String,
    correlation_token: Option<Value>,
    list_version: Option<u64>,
    start_index: i64,
    minimum_inclusive: Option<i64>,
    maximum_exclusive: Option<i64>,
    items: Vec<Value>,
}

pub fn load_response(list_id: &str) -> LoadResponseBuilder {
    LoadResponseBuilder {
        list_id: list_id.to_string(),
        correlation_token: None,
        list_version: None,
        start_index: 0,
        minimum_inclusive: None,
        maximum_exclusive: None,
        items: Vec::new(),
    }
}

impl LoadResponseBuilder {
    pub fn token(mut self, token: &str) -> Self {
        self.correlation_token = Some(json!(token));
        self
    }

    /// A correlation token echoed back as a number instead of a string.
    pub fn numeric_token(mut self, token: u64) -> Self {
        self.correlation_token = Some(json!(token));
        self
    }

    pub fn version(mut self, version: u64) -> Self {
        self.list_version = Some(version);
        self
    }

    pub fn start_index(mut self, start_index: i64) -> Self {
        self.start_index = start_index;
        self
    }

    pub fn minimum(mut self, minimum: i64) -> Self {
        self.minimum_inclusive = Some(minimum);
        self
    }

    pub fn maximum(mut self, maximum: i64) -> Self {
        self.maximum_exclusive = Some(maximum);
        self
    }

    pub fn bounds(mut self, minimum: i64, maximum: i64) -> Self {
        self.minimum_inclusive = Some(minimum);
        self.maximum_exclusive = Some(maximum);
        self
    }

    pub fn items(mut self, items: Vec<Value>) -> Self {
        self.items = items;
        self
    }

    pub fn build(self) -> Value {
        let mut map = Map::new();
        map.insert("listId".to_string(), json!(self.list_id));
        if let Some(token) = self.correlation_token {
            map.insert("correlationToken".to_string(), token);
        }
        if let Some(version) = self.list_version {
            map.insert("listVersion".to_string(), json!(version));
        }
        map.insert("startIndex".to_string(), json!(self.start_index));
        if let Some(minimum) = self.minimum_inclusive {
            map.insert("minimumInclusiveIndex".to_string(), json!(minimum));
        }
        if let Some(maximum) = self.maximum_exclusive {
            map.insert("maximumExclusiveIndex".to_string(), json!(maximum));
        }
        map.insert("items".to_string(), Value::Array(self.items));
        Value::Object(map)
    }
}

/// Fluent builder for mutation batches.
pub struct MutationBuilder {
    list_id: String,
    list_version: Option<u64>,
    presentation_token: Option<String>,
    operations: Vec<Value>,
}

pub fn mutation(list_id: &str, version: u64) -> MutationBuilder {
    MutationBuilder {
        list_id: list_id.to_string(),
        list_version: Some(version),
        presentation_token: None,
        operations: Vec::new(),
    }
}

/// A mutation batch that omits `listVersion` entirely.
pub fn unversioned_mutation(list_id: &str) -> MutationBuilder {
    MutationBuilder {
        list_id: list_id.to_string(),
        list_version: None,
        presentation_token: None,
        operations: Vec::new(),
    }
}

impl MutationBuilder {
    pub fn insert(mut self, index: i64, item: Value) -> Self {
        self.operations
            .push(json!({"type": "Insert", "index": index, "item": item}));
        self
    }

    pub fn replace(mut self, index: i64, item: Value) -> Self {
        self.operations
            .push(json!({"type": "Replace", "index": index, "item": item}));
        self
    }

    pub fn delete(mut self, index: i64) -> Self {
        self.operations
            .push(json!({"type": "Delete", "index": index}));
        self
    }

    pub fn insert_range(mut self, index: i64, items: Vec<Value>) -> Self {
        self.operations
            .push(json!({"type": "InsertRange", "index": index, "items": items}));
        self
    }

    pub fn delete_range(mut self, index: i64, count: usize) -> Self {
        self.operations
            .push(json!({"type": "DeleteRange", "index": index, "count": count}));
        self
    }

    /// Append an operation entry as-is, malformed ones included.
    pub fn raw_operation(mut self, operation: Value) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn presentation_token(mut self, token: &str) -> Self {
        self.presentation_token = Some(token.to_string());
        self
    }

    pub fn build(self) -> Value {
        let mut map = Map::new();
        map.insert("listId".to_string(), json!(self.list_id));
        if let Some(version) = self.list_version {
            map.insert("listVersion".to_string(), json!(version));
        }
        if let Some(token) = self.presentation_token {
            map.insert("presentationToken".to_string(), json!(token));
        }
        map.insert("operations".to_string(), Value::Array(self.operations));
        Value::Object(map)
    }
}
