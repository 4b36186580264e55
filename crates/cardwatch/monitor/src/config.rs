//! Configuration options for card monitoring

use std::time::Duration;

use crate::manager::Scope;

/// Default bound on a single blocking wait
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default name of the poll thread
pub const DEFAULT_THREAD_NAME: &str = "cardwatch-poll";

/// Configuration options for a card monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Scope of the resource manager context
    pub scope: Scope,

    /// Bound on each blocking wait, and so on the latency of a stop request
    pub wait_timeout: Duration,

    /// Name given to the poll thread
    pub thread_name: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            scope: Scope::System,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

impl MonitorConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the context scope
    pub const fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the wait timeout
    pub const fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Set the poll thread name
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::new();
        assert_eq!(config.scope, Scope::System);
        assert_eq!(config.wait_timeout, Duration::from_millis(1000));
        assert_eq!(config.thread_name, "cardwatch-poll");
    }

    #[test]
    fn test_builder() {
        let config = MonitorConfig::new()
            .with_scope(Scope::User)
            .with_wait_timeout(Duration::from_millis(250))
            .with_thread_name("reader-watch");
        assert_eq!(config.scope, Scope::User);
        assert_eq!(config.wait_timeout, Duration::from_millis(250));
        assert_eq!(config.thread_name, "reader-watch");
    }
}
