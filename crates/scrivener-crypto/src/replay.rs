use crate::error::AuthError;

/// Maximum clock drift tolerated between a signature timestamp and server time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayWindow {
    pub window_secs: u64,
}

impl ReplayWindow {
    pub const fn new(window_secs: u64) -> Self {
        Self { window_secs }
    }

    /// Accept iff `|now - timestamp| <= window_secs`.
    pub fn check(&self, timestamp: i64, now: i64) -> Result<(), AuthError> {
        if timestamp.abs_diff(now) <= self.window_secs {
            Ok(())
        } else {
            Err(AuthError::ExpiredTimestamp)
        }
    }
}

/// Current wall-clock time in unix seconds.
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}
