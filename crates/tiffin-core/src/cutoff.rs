//! Cutoff policy
//!
//! Two distinct lock windows coexist and are deliberately kept apart:
//!
//! - the **per-delivery cutoff**: a delivery dated `D` can no longer be
//!   modified from `D - 1 day` at the cutoff hour (20:00 local). This
//!   boundary is monotonic; once a delivery locks it never reopens.
//! - the **weekly lock**: subscription-level address changes are
//!   rejected from Friday at the cutoff hour through Sunday 23:59:59,
//!   reopening Monday 00:00 local.
//!
//! Both are pure predicates over an injected instant; no I/O, no
//! ambient clock reads.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use chrono::{Datelike, Timelike, Weekday};
use serde::Serialize;

/// Outcome of a weekly lock-window query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LockStatus {
    /// Whether the weekly lock is currently engaged
    pub locked: bool,
    /// When modifications reopen, present only while locked
    pub next_available_at: Option<DateTime<Utc>>,
}

/// Pure temporal predicates for both lock windows
#[derive(Debug, Clone, Copy)]
pub struct CutoffPolicy {
    offset: FixedOffset,
    cutoff_hour: u32,
}

impl CutoffPolicy {
    /// Create a policy for the given local offset and cutoff hour
    pub fn new(offset: FixedOffset, cutoff_hour: u32) -> Self {
        Self {
            offset,
            cutoff_hour: cutoff_hour.min(23),
        }
    }

    /// Project an instant into marketplace-local naive time
    fn to_local(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.offset).naive_local()
    }

    /// Project a local naive datetime back to UTC
    ///
    /// A fixed offset has no gaps or folds, so the conversion is
    /// always unambiguous.
    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        local
            .and_local_timezone(self.offset)
            .unwrap()
            .with_timezone(&Utc)
    }

    /// The current calendar day in marketplace-local time
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        self.to_local(now).date()
    }

    /// Whether modifications to a delivery dated `delivery_date` are locked
    ///
    /// Locked from the evening before the delivery: `now_local >=
    /// (delivery_date - 1 day) at the cutoff hour`. Monotonic in `now`.
    pub fn is_locked_for_delivery(&self, now: DateTime<Utc>, delivery_date: NaiveDate) -> bool {
        let boundary = (delivery_date - Duration::days(1))
            .and_hms_opt(self.cutoff_hour, 0, 0)
            .expect("cutoff hour is below 24");
        self.to_local(now) >= boundary
    }

    /// Whether the weekly lock window is currently engaged
    ///
    /// Engaged Friday from the cutoff hour, all of Saturday and all of
    /// Sunday. Open Monday 00:00:00 through Friday one second before
    /// the cutoff hour.
    pub fn is_weekly_locked(&self, now: DateTime<Utc>) -> bool {
        let local = self.to_local(now);
        match local.weekday() {
            Weekday::Sat | Weekday::Sun => true,
            Weekday::Fri => local.hour() >= self.cutoff_hour,
            _ => false,
        }
    }

    /// The next Monday 00:00 local, strictly after `now`
    ///
    /// Called while locked this is the reopening instant; it also rolls
    /// over correctly when `now` is already past Sunday midnight into
    /// the open part of the week.
    pub fn next_weekly_unlock(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local = self.to_local(now);
        let days_ahead = 7 - i64::from(local.weekday().num_days_from_monday());
        let monday = (local.date() + Duration::days(days_ahead))
            .and_hms_opt(0, 0, 0)
            .expect("midnight is valid");
        self.to_utc(monday)
    }

    /// Weekly lock state plus the reopening instant for clients
    pub fn lock_status(&self, now: DateTime<Utc>) -> LockStatus {
        if self.is_weekly_locked(now) {
            LockStatus {
                locked: true,
                next_available_at: Some(self.next_weekly_unlock(now)),
            }
        } else {
            LockStatus {
                locked: false,
                next_available_at: None,
            }
        }
    }
}
