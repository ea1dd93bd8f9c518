//! Configuration for the scope engine.

/// Default maximum node-dispatch depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default number of error records retained by the error handler.
pub const DEFAULT_ERROR_BUFFER_SIZE: usize = 100;

/// Configuration for the scope engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum nesting of resolver dispatches before `DepthLimitError`.
    pub max_depth: usize,
    /// Capacity of the error handler's ring buffer.
    pub error_buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            error_buffer_size: DEFAULT_ERROR_BUFFER_SIZE,
        }
    }
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the depth limit.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Builder method to set the error buffer capacity.
    #[must_use]
    pub fn with_error_buffer_size(mut self, size: usize) -> Self {
        self.error_buffer_size = size;
        self
    }
}
