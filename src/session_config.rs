use std::time::Duration;

/// Runtime configuration for a [`Session`](crate::Session).
///
/// Controls the default expectation deadline, the observed-event history
/// kept for timeout diagnostics, and the drain settle behavior. Use the
/// builder pattern to customize, or use [`Default`] for sensible defaults.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use protoq::SessionConfig;
///
/// let config = SessionConfig::default()
///     .with_default_timeout(Duration::from_secs(30))  // Slow service under test
///     .with_history_limit(100);                       // Keep more context on failure
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    /// Deadline applied to `expect`/`expect_many` when `.within()` is not
    /// used.
    /// Default: 10 seconds
    default_timeout: Duration,

    /// How many observed-but-unmatched events to retain for timeout
    /// diagnostics.
    /// Default: 50
    history_limit: usize,

    /// During `drain`, how long the queue must stay quiet before the
    /// session is considered settled.
    /// Default: 1ms
    drain_window: Duration,

    /// Upper bound on total `drain` time, so chatty adapters cannot stall
    /// teardown indefinitely.
    /// Default: 10ms
    max_drain: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            default_timeout: Duration::from_secs(10),
            history_limit: 50,
            drain_window: Duration::from_millis(1),
            max_drain: Duration::from_millis(10),
        }
    }
}

impl SessionConfig {
    /// Set the default expectation deadline.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Returns the default expectation deadline.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Set how many observed-but-unmatched events are retained for
    /// timeout diagnostics.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Returns the observed-event history limit.
    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Set the quiet window used by `drain`.
    pub fn with_drain_window(mut self, window: Duration) -> Self {
        self.drain_window = window;
        self
    }

    /// Returns the quiet window used by `drain`.
    pub fn drain_window(&self) -> Duration {
        self.drain_window
    }

    /// Set the upper bound on total `drain` time.
    pub fn with_max_drain(mut self, max: Duration) -> Self {
        self.max_drain = max;
        self
    }

    /// Returns the upper bound on total `drain` time.
    pub fn max_drain(&self) -> Duration {
        self.max_drain
    }
}
