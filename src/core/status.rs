//! Membership lifecycle status derivation.
//!
//! A member's status is a pure function of the plan end date and a reference
//! instant ("now"). Both are reduced to their calendar day before they are
//! compared, so the time of day never shifts a member across a boundary.
//! Days are counted at a fixed UTC offset, the gym's local time; the plain
//! functions count UTC days.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Members whose plan ends within this many days are flagged as expiring soon.
pub const EXPIRING_SOON_WINDOW_DAYS: i64 = 14;

/// Lifecycle state of a membership relative to a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberStatus {
    /// More than two weeks remain on the plan
    Active,
    /// The plan ends today or within the next two weeks
    ExpiringSoon,
    /// The plan ended before the reference date
    Expired,
}

impl MemberStatus {
    /// The wire name used in persisted documents (`active`, `expiring-soon`, `expired`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::ExpiringSoon => "expiring-soon",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status filter for member listings. `All` is the identity filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Keep every member
    #[default]
    All,
    /// Keep only members with this status
    Only(MemberStatus),
}

impl StatusFilter {
    /// Whether a member with `status` passes this filter.
    #[must_use]
    pub fn matches(self, status: MemberStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl From<Option<MemberStatus>> for StatusFilter {
    fn from(value: Option<MemberStatus>) -> Self {
        value.map_or(Self::All, Self::Only)
    }
}

/// Whole UTC days from the reference day to the end day. Negative once the plan has ended.
#[must_use]
pub fn days_remaining(end_date: DateTime<Utc>, reference: DateTime<Utc>) -> i64 {
    days_remaining_at(end_date, reference, Utc.fix())
}

/// Whole days from the reference day to the end day, with days starting at
/// local midnight for `offset`.
#[must_use]
pub fn days_remaining_at(
    end_date: DateTime<Utc>,
    reference: DateTime<Utc>,
    offset: FixedOffset,
) -> i64 {
    days_between(local_day(reference, offset), local_day(end_date, offset))
}

fn local_day(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

/// Derives the lifecycle status of a plan ending at `end_date`, as seen at `reference`.
///
/// * fewer than 0 days remaining: [`MemberStatus::Expired`]
/// * 0 to 14 days remaining: [`MemberStatus::ExpiringSoon`]
/// * more than 14 days remaining: [`MemberStatus::Active`]
#[must_use]
pub fn derive_status(end_date: DateTime<Utc>, reference: DateTime<Utc>) -> MemberStatus {
    derive_status_at(end_date, reference, Utc.fix())
}

/// [`derive_status`] with calendar days taken at `offset` instead of UTC.
#[must_use]
pub fn derive_status_at(
    end_date: DateTime<Utc>,
    reference: DateTime<Utc>,
    offset: FixedOffset,
) -> MemberStatus {
    let days = days_remaining_at(end_date, reference, offset);
    if days < 0 {
        MemberStatus::Expired
    } else if days <= EXPIRING_SOON_WINDOW_DAYS {
        MemberStatus::ExpiringSoon
    } else {
        MemberStatus::Active
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_end_yesterday_is_expired() {
        let now = at(2024, 6, 15, 9, 0);
        assert_eq!(
            derive_status(now - Duration::days(1), now),
            MemberStatus::Expired
        );
    }

    #[test]
    fn test_end_today_is_expiring_soon_regardless_of_time() {
        // Plan ended earlier today: still the same calendar day
        let now = at(2024, 6, 15, 23, 59);
        let end = at(2024, 6, 15, 0, 1);
        assert_eq!(days_remaining(end, now), 0);
        assert_eq!(derive_status(end, now), MemberStatus::ExpiringSoon);
    }

    #[test]
    fn test_window_boundaries() {
        let now = at(2024, 6, 15, 12, 0);
        assert_eq!(
            derive_status(now + Duration::days(5), now),
            MemberStatus::ExpiringSoon
        );
        assert_eq!(
            derive_status(now + Duration::days(14), now),
            MemberStatus::ExpiringSoon
        );
        assert_eq!(
            derive_status(now + Duration::days(15), now),
            MemberStatus::Active
        );
    }

    #[test]
    fn test_time_of_day_does_not_shift_the_boundary() {
        // 14 days and ~23 hours apart in wall-clock time, still 14 calendar days
        let now = at(2024, 6, 1, 0, 0);
        let end = at(2024, 6, 15, 23, 0);
        assert_eq!(days_remaining(end, now), 14);
        assert_eq!(derive_status(end, now), MemberStatus::ExpiringSoon);

        // Late-evening reference one day before the end is one day, not zero
        let now = at(2024, 6, 14, 23, 30);
        let end = at(2024, 6, 15, 0, 30);
        assert_eq!(days_remaining(end, now), 1);
    }

    #[test]
    fn test_monthly_plan_enrolled_today_is_active() {
        let now = at(2024, 1, 10, 8, 0);
        let end = at(2024, 2, 10, 8, 0);
        assert_eq!(derive_status(end, now), MemberStatus::Active);
    }

    #[test]
    fn test_status_is_expired_iff_end_day_before_reference_day() {
        let now = at(2024, 3, 1, 10, 0);
        for offset in -40..=40 {
            let end = now + Duration::days(offset);
            let status = derive_status(end, now);
            assert_eq!(status == MemberStatus::Expired, offset < 0, "offset {offset}");
            assert_eq!(
                status == MemberStatus::ExpiringSoon,
                (0..=14).contains(&offset),
                "offset {offset}"
            );
        }
    }

    #[test]
    fn test_local_offset_moves_the_day_boundary() {
        // 02:00 UTC on the 16th is still the evening of the 15th in New York (UTC-5)
        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = at(2024, 6, 16, 2, 0);
        let end = at(2024, 6, 15, 12, 0);

        assert_eq!(days_remaining(end, now), -1);
        assert_eq!(derive_status(end, now), MemberStatus::Expired);
        assert_eq!(days_remaining_at(end, now, new_york), 0);
        assert_eq!(derive_status_at(end, now, new_york), MemberStatus::ExpiringSoon);
    }

    #[test]
    fn test_zero_offset_matches_utc_rule() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let now = at(2024, 3, 1, 23, 30);
        for offset in [-2, 0, 14, 15] {
            let end = now + Duration::days(offset);
            assert_eq!(derive_status_at(end, now, utc), derive_status(end, now));
        }
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&MemberStatus::ExpiringSoon).unwrap(),
            "\"expiring-soon\""
        );
        assert_eq!(MemberStatus::Expired.to_string(), "expired");
        let parsed: MemberStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(parsed, MemberStatus::Active);
    }

    #[test]
    fn test_status_filter() {
        assert!(StatusFilter::All.matches(MemberStatus::Expired));
        assert!(StatusFilter::Only(MemberStatus::Active).matches(MemberStatus::Active));
        assert!(!StatusFilter::Only(MemberStatus::Active).matches(MemberStatus::Expired));
        assert_eq!(StatusFilter::from(None), StatusFilter::All);
    }
}
