//! Retry policy for milestone delivery.

use chrono::Duration;

use crate::domain::foundation::ValidationError;

/// Exponential backoff with a capped attempt count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_backoff: Duration,
    multiplier: u32,
    max_backoff: Duration,
}

impl RetryPolicy {
    /// # Errors
    ///
    /// - `OutOfRange` on `max_attempts` when zero
    /// - `OutOfRange` on `backoff_multiplier` when zero
    /// - `InvalidFormat` on `base_backoff` when not positive or above the cap
    pub fn new(
        max_attempts: u32,
        base_backoff: Duration,
        multiplier: u32,
        max_backoff: Duration,
    ) -> Result<Self, ValidationError> {
        if max_attempts == 0 {
            return Err(ValidationError::out_of_range("max_attempts", 1, i32::MAX, 0));
        }
        if multiplier == 0 {
            return Err(ValidationError::out_of_range("backoff_multiplier", 1, i32::MAX, 0));
        }
        if base_backoff <= Duration::zero() || base_backoff > max_backoff {
            return Err(ValidationError::invalid_format(
                "base_backoff",
                "must be positive and no larger than the maximum backoff",
            ));
        }
        Ok(Self {
            max_attempts,
            base_backoff,
            multiplier,
            max_backoff,
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_backoff(&self) -> Duration {
        self.base_backoff
    }

    /// True when another attempt may follow a failed `attempt`.
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before the attempt following a failed `attempt` (1-based):
    /// `base * multiplier^(attempt - 1)`, capped.
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let base_ms = self.base_backoff.num_milliseconds();
        let cap_ms = self.max_backoff.num_milliseconds();
        let mut delay_ms = base_ms;
        for _ in 1..attempt.max(1) {
            delay_ms = delay_ms.saturating_mul(i64::from(self.multiplier));
            if delay_ms >= cap_ms {
                return self.max_backoff;
            }
        }
        Duration::milliseconds(delay_ms.min(cap_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::seconds(60),
            multiplier: 2,
            max_backoff: Duration::seconds(3600),
        }
    }
}
