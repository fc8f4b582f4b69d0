//! Polling time window

use chrono::{DateTime, Utc};

/// The `[since, now)` window of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollWindow {
    pub since: DateTime<Utc>,
    pub now: DateTime<Utc>,
}

impl PollWindow {
    pub fn new(since: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self { since, now }
    }

    /// `since <= time < now`
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        time >= self.since && time < self.now
    }
}
