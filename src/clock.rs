use chrono::{DateTime, Utc};

/// Milliseconds in one day
pub const DAY_MS: i64 = 86_400_000;

/// Source of the current time as epoch milliseconds
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Wall clock backed by chrono
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock pinned to a settable instant
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FixedClock(std::cell::Cell<i64>);

#[cfg(test)]
impl FixedClock {
    pub fn at(now_ms: i64) -> Self {
        Self(std::cell::Cell::new(now_ms))
    }

    pub fn advance_days(&self, days: i64) {
        self.0.set(self.0.get() + days * DAY_MS);
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0.get()
    }
}

#[cfg(test)]
impl Clock for &FixedClock {
    fn now_ms(&self) -> i64 {
        self.0.get()
    }
}

/// UTC calendar date of an epoch-millisecond timestamp, as `YYYY-MM-DD`
pub fn date_key(now_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(now_ms)
        .unwrap_or_default()
        .format("%Y-%m-%d")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_key() {
        // 2024-03-05T23:59:59.999Z
        assert_eq!(date_key(1_709_683_199_999), "2024-03-05");
        assert_eq!(date_key(0), "1970-01-01");
    }

    #[test]
    fn test_fixed_clock_advance() {
        let clock = FixedClock::at(1_000);
        clock.advance_days(2);
        assert_eq!(clock.now_ms(), 1_000 + 2 * DAY_MS);
    }
}
