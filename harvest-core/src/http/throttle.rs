//! Fixed-interval pause between outbound requests.

use std::time::Duration;

use tokio::time::sleep;

/// Fixed post-request delay used to stay under the API's rate limit.
///
/// Unlike a token bucket this never adapts: every call is followed by the
/// same pause, whether it succeeded or not.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    delay: Duration,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// A throttle that never sleeps (tests, local fixtures).
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Suspend for the configured interval.
    pub async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        sleep(self.delay).await;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::from_millis(300)
    }
}
