use std::time::Duration;

/// Engine-wide tunables. Kept as an explicit, caller-owned struct rather than
/// process-global statics, so independent engines (e.g. in tests) never share
/// mutable global state.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Size in bytes of every on-disk page.
    pub page_size: usize,
    /// Fixed on-disk width, in bytes, of a String field.
    pub string_length: usize,
    /// Maximum number of pages the buffer pool will cache at once.
    pub buffer_pool_capacity: usize,
    /// How long a transaction waits to acquire a page latch before failing
    /// with `Deadlock`.
    pub lock_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            page_size: 4096,
            string_length: 128,
            buffer_pool_capacity: 50,
            lock_timeout: Duration::from_millis(100),
        }
    }
}

impl EngineConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_string_length(mut self, string_length: usize) -> Self {
        self.string_length = string_length;
        self
    }

    pub fn with_buffer_pool_capacity(mut self, capacity: usize) -> Self {
        self.buffer_pool_capacity = capacity;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}
