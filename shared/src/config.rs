use crate::clock::LogicalTime;

/// Configuration shared by every list attached to one provider. Immutable
/// once the provider is constructed.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SourceConfig {
    /// Type tag an initial snapshot must declare to be accepted.
    pub source_type: String,
    /// Number of items requested per fetch.
    pub cache_chunk_size: usize,
    /// Maximum number of out-of-order updates buffered per list.
    pub list_update_buffer_size: usize,
    /// Retries granted to one requested range before it terminally fails.
    pub fetch_retries: usize,
    /// Milliseconds an outstanding fetch waits before consuming a retry.
    pub fetch_timeout: LogicalTime,
    /// Milliseconds a buffered out-of-order update waits for its gap to
    /// close before it is dropped.
    pub cache_expiry_timeout: LogicalTime,
}

impl SourceConfig {
    pub fn new(source_type: &str) -> Self {
        Self {
            source_type: source_type.to_string(),
            cache_chunk_size: 10,
            list_update_buffer_size: 5,
            fetch_retries: 2,
            fetch_timeout: 5000,
            cache_expiry_timeout: 5000,
        }
    }

    pub fn with_chunk_size(mut self, cache_chunk_size: usize) -> Self {
        self.cache_chunk_size = cache_chunk_size;
        self
    }

    pub fn with_update_buffer_size(mut self, list_update_buffer_size: usize) -> Self {
        self.list_update_buffer_size = list_update_buffer_size;
        self
    }

    pub fn with_fetch_retries(mut self, fetch_retries: usize) -> Self {
        self.fetch_retries = fetch_retries;
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: LogicalTime) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn with_cache_expiry_timeout(mut self, cache_expiry_timeout: LogicalTime) -> Self {
        self.cache_expiry_timeout = cache_expiry_timeout;
        self
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::new("dynamicList")
    }
}
