//! Clock abstraction for token expiry checks.
//!
//! Expiry is evaluated against an injected clock so tests are deterministic
//! and a broken system clock cannot panic the request path.

use qrflow_core::EpochSecs;

/// Source of the current time in Unix epoch seconds.
pub trait Clock: Send + Sync {
    fn now_epoch_secs(&self) -> EpochSecs;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_secs(&self) -> EpochSecs {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub EpochSecs);

impl Clock for FixedClock {
    fn now_epoch_secs(&self) -> EpochSecs {
        self.0
    }
}
