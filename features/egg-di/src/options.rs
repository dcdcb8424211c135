use std::time::Duration;

/// Teardown bound used when nothing else is configured
pub const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration of a hatched call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HatchOptions {
    /// Bound for each generator teardown, `None` waits forever
    pub teardown_timeout: Option<Duration>,
    /// Bound for resolution plus target invocation, `None` waits forever
    pub timeout: Option<Duration>,
}
impl Default for HatchOptions {
    fn default() -> Self {
        Self {
            teardown_timeout: Some(DEFAULT_TEARDOWN_TIMEOUT),
            timeout: None,
        }
    }
}

impl HatchOptions {
    pub fn with_teardown_timeout(self, teardown_timeout: Option<Duration>) -> Self {
        Self {
            teardown_timeout,
            ..self
        }
    }

    pub fn with_timeout(self, timeout: Option<Duration>) -> Self {
        Self { timeout, ..self }
    }
}
