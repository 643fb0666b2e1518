//! Expiry threshold classification.
//!
//! Maps (now, expires_at) to a lifecycle band. Bands are evaluated in
//! precedence order over half-open intervals so that every instant falls
//! in exactly one band -- an enrollment sitting exactly on the 24-hour
//! boundary must not match both warning windows and fire twice.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How close an enrollment is to expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    /// No expiry set; never a candidate.
    NotApplicable,
    /// Past its expiry instant.
    Expired,
    /// Expires within the next 24 hours (inclusive).
    ExpiringIn24h,
    /// Expires after 24 hours but within 72 hours.
    ExpiringIn3Days,
    /// More than 72 hours of access left.
    Active,
}

/// Classify an enrollment's expiry against `now`. First match wins:
///
/// 1. no `expires_at`            -> `NotApplicable`
/// 2. `expires_at < now`         -> `Expired`
/// 3. `delta <= 24h`             -> `ExpiringIn24h`
/// 4. `24h < delta <= 72h`       -> `ExpiringIn3Days`
/// 5. otherwise                  -> `Active`
pub fn classify(now: DateTime<Utc>, expires_at: Option<DateTime<Utc>>) -> Band {
    let expires_at = match expires_at {
        Some(t) => t,
        None => return Band::NotApplicable,
    };

    let delta = expires_at - now;
    if delta < Duration::zero() {
        Band::Expired
    } else if delta <= Duration::hours(24) {
        Band::ExpiringIn24h
    } else if delta <= Duration::hours(72) {
        Band::ExpiringIn3Days
    } else {
        Band::Active
    }
}

/// Whole days of access left, rounded up. Feeds the "Còn N ngày" text, so
/// the ceiling (not floor) is part of the message contract.
pub fn days_remaining(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> i64 {
    ceil_div((expires_at - now).num_seconds().max(0), 86_400)
}

/// Whole hours of access left, rounded up.
pub fn hours_remaining(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> i64 {
    ceil_div((expires_at - now).num_seconds().max(0), 3_600)
}

fn ceil_div(num: i64, den: i64) -> i64 {
    (num + den - 1) / den
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(now: DateTime<Utc>, offset_secs: i64) -> Option<DateTime<Utc>> {
        Some(now + Duration::seconds(offset_secs))
    }

    #[test]
    fn no_expiry_is_not_applicable() {
        assert_eq!(classify(Utc::now(), None), Band::NotApplicable);
    }

    #[test]
    fn past_expiry_is_expired() {
        let now = Utc::now();
        assert_eq!(classify(now, at(now, -1)), Band::Expired);
        assert_eq!(classify(now, at(now, -86_400 * 30)), Band::Expired);
    }

    #[test]
    fn boundaries_resolve_to_exactly_one_band() {
        let now = Utc::now();
        // Expiring right now still counts as the 24h window.
        assert_eq!(classify(now, at(now, 0)), Band::ExpiringIn24h);
        // Exactly 24h out belongs to the 24h window, not the 3-day one.
        assert_eq!(classify(now, at(now, 24 * 3_600)), Band::ExpiringIn24h);
        assert_eq!(classify(now, at(now, 24 * 3_600 + 1)), Band::ExpiringIn3Days);
        // Exactly 72h out is still the 3-day window.
        assert_eq!(classify(now, at(now, 72 * 3_600)), Band::ExpiringIn3Days);
        assert_eq!(classify(now, at(now, 72 * 3_600 + 1)), Band::Active);
    }

    #[test]
    fn remaining_time_rounds_up() {
        let now = Utc::now();
        let e = now + Duration::hours(2);
        assert_eq!(hours_remaining(now, e), 2);
        let e = now + Duration::minutes(90);
        assert_eq!(hours_remaining(now, e), 2);
        let e = now + Duration::hours(48);
        assert_eq!(days_remaining(now, e), 2);
        let e = now + Duration::hours(49);
        assert_eq!(days_remaining(now, e), 3);
        // Already expired: clamp at zero rather than going negative.
        let e = now - Duration::hours(5);
        assert_eq!(hours_remaining(now, e), 0);
        assert_eq!(days_remaining(now, e), 0);
    }

    proptest! {
        /// Every offset lands in exactly one band, and that band agrees
        /// with independent membership predicates over the same intervals.
        #[test]
        fn classify_is_total_and_exclusive(offset_secs in -1_000_000i64..1_000_000i64) {
            let now = Utc::now();
            let expires_at = now + Duration::seconds(offset_secs);
            let band = classify(now, Some(expires_at));

            let expired = offset_secs < 0;
            let in_24h = (0..=24 * 3_600).contains(&offset_secs);
            let in_3d = (24 * 3_600 + 1..=72 * 3_600).contains(&offset_secs);
            let active = offset_secs > 72 * 3_600;

            let matches = [expired, in_24h, in_3d, active]
                .iter()
                .filter(|m| **m)
                .count();
            prop_assert_eq!(matches, 1);

            let expected = if expired {
                Band::Expired
            } else if in_24h {
                Band::ExpiringIn24h
            } else if in_3d {
                Band::ExpiringIn3Days
            } else {
                Band::Active
            };
            prop_assert_eq!(band, expected);
        }

        #[test]
        fn remaining_time_is_a_ceiling(offset_secs in 1i64..1_000_000i64) {
            let now = Utc::now();
            let expires_at = now + Duration::seconds(offset_secs);
            let hours = hours_remaining(now, expires_at);
            let days = days_remaining(now, expires_at);
            prop_assert!(hours * 3_600 >= offset_secs);
            prop_assert!((hours - 1) * 3_600 < offset_secs);
            prop_assert!(days * 86_400 >= offset_secs);
            prop_assert!((days - 1) * 86_400 < offset_secs);
        }
    }
}
