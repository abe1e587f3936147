// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Injectable wall clock.

use chrono::{DateTime, TimeDelta, Utc};

/// Source of the current time. Components that compare timestamps take a
/// clock so tests can move time without sleeping.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// `at + delta`, clamped to the latest representable instant.
pub fn later_by(at: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    at.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `at - delta`, clamped to the earliest representable instant.
pub fn earlier_by(at: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    at.checked_sub_signed(delta).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_within_range_are_exact() {
        let now = Utc::now();
        assert_eq!(later_by(now, TimeDelta::minutes(5)), now + TimeDelta::minutes(5));
        assert_eq!(earlier_by(now, TimeDelta::hours(1)), now - TimeDelta::hours(1));
    }

    #[test]
    fn huge_offsets_clamp_instead_of_overflowing() {
        let now = Utc::now();
        assert_eq!(later_by(now, TimeDelta::MAX), DateTime::<Utc>::MAX_UTC);
        assert_eq!(earlier_by(now, TimeDelta::MAX), DateTime::<Utc>::MIN_UTC);
        let far = TimeDelta::seconds(10_000_000_000_000);
        assert_eq!(later_by(now, far), DateTime::<Utc>::MAX_UTC);
    }
}
