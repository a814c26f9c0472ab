use std::time::Duration;

/// Request budget for one role: at most `max_requests` per `window`.
/// Counting happens in the API middleware; this is only the table value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub window: Duration,
    pub max_requests: u32,
}

impl RateLimit {
    pub const fn new(window: Duration, max_requests: u32) -> Self {
        Self { window, max_requests }
    }

    pub const fn per_minutes(minutes: u64, max_requests: u32) -> Self {
        Self::new(Duration::from_secs(minutes * 60), max_requests)
    }
}
