#![forbid(unsafe_code)]

//! Store configuration.

/// Default bound on queued intents in the dispatch strategy.
pub const DEFAULT_MAX_QUEUE_DEPTH: usize = 256;

/// Configuration shared by both store strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabStoreConfig {
    /// Name attached to every log event from this store.
    pub label: String,
    /// Maximum intents waiting in the dispatch queue. Reaching it usually
    /// means observers keep re-submitting intents in a loop.
    pub max_queue_depth: usize,
    /// Publish a snapshot at the end of every dispatch drain. When off,
    /// the published snapshot only moves on an explicit `publish()`.
    /// The local strategy always publishes.
    pub auto_publish: bool,
}

impl Default for TabStoreConfig {
    fn default() -> Self {
        Self {
            label: "mdi".to_owned(),
            max_queue_depth: DEFAULT_MAX_QUEUE_DEPTH,
            auto_publish: false,
        }
    }
}

impl TabStoreConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the queue bound. Clamped to at least 1.
    #[must_use]
    pub fn max_queue_depth(mut self, depth: usize) -> Self {
        self.max_queue_depth = depth.max(1);
        self
    }

    #[must_use]
    pub fn auto_publish(mut self, enabled: bool) -> Self {
        self.auto_publish = enabled;
        self
    }
}
