//! Policy configuration.

use std::time::Duration;

/// Which constraints a tracked timestamp must satisfy.
///
/// Presence is always checked; everything else is opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolicyConfig {
    /// Reject start timestamps more than a second in the future.
    pub prevent_future: bool,

    /// Revert changes to the timestamp once the record is persisted.
    pub prevent_update: bool,

    /// Longest allowed time between start and submission.
    pub max_duration: Option<Duration>,

    /// Shortest allowed time between start and submission.
    pub min_duration: Option<Duration>,
}

impl PolicyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prevent_future(mut self, enabled: bool) -> Self {
        self.prevent_future = enabled;
        self
    }

    pub fn with_prevent_update(mut self, enabled: bool) -> Self {
        self.prevent_update = enabled;
        self
    }

    pub fn with_max_duration(mut self, max: Duration) -> Self {
        self.max_duration = Some(max);
        self
    }

    pub fn with_min_duration(mut self, min: Duration) -> Self {
        self.min_duration = Some(min);
        self
    }
}
