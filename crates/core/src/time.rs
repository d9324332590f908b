//! Where session start/end times and logged failure times come from.

use chrono::{DateTime, TimeZone, Utc};

/// Unix seconds of 2023-11-14T22:13:20Z.
const PINNED_SECONDS: i64 = 1_700_000_000;

/// The training runtime reads every timestamp through a `Clock`, so tests can
/// pin session and failure times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Fixed(at) => *at,
        }
    }
}

/// The instant fixed clocks in tests are pinned to.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.timestamp_opt(PINNED_SECONDS, 0)
        .single()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_never_moves() {
        let clock = Clock::fixed(fixed_now());
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().timestamp(), PINNED_SECONDS);
    }

    #[test]
    fn system_clock_is_the_default() {
        let before = Utc::now();
        let now = Clock::default().now();
        assert_eq!(Clock::default(), Clock::System);
        assert!(now >= before);
    }
}
