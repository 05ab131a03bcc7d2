use chrono::{DateTime, Duration, Utc};

/// Abstraction over "current time" so token expiry is deterministic in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// True once `now` is within `margin` of `deadline` (or past it).
    fn has_passed(&self, deadline: DateTime<Utc>, margin: Duration) -> bool {
        self.now() + margin >= deadline
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn deadline_within_margin_counts_as_passed() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = FixedClock::new(now);

        assert!(clock.has_passed(now + Duration::seconds(30), Duration::seconds(60)));
        assert!(!clock.has_passed(now + Duration::seconds(120), Duration::seconds(60)));
        assert!(clock.has_passed(now - Duration::seconds(1), Duration::zero()));
    }
}
