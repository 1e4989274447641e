//! Property-based tests for the cutoff policy and schedule generator
//!
//! These tests verify:
//! - The per-delivery lock is monotonic: once locked, never unlocked
//! - The weekly lock partitions every week the same way
//! - The next unlock instant is always a Monday midnight strictly ahead
//! - Schedule generation always yields a full, consecutive week

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use proptest::prelude::*;

use tiffin_core::{build_week, CutoffPolicy};
use tiffin_types::{
    Address, ChefId, MealType, PlanId, Subscription, SubscriptionId, SubscriptionStatus, UserId,
};

// ============================================================================
// Strategies
// ============================================================================

/// Instants spread over a decade (2020-2030)
fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (1_577_836_800i64..1_893_456_000i64)
        .prop_map(|secs| Utc.timestamp_opt(secs, 0).single().unwrap())
}

/// Calendar dates in the same range
fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (18262i32..22000i32).prop_map(|days| {
        NaiveDate::from_num_days_from_ce_opt(days + 719_163).unwrap()
    })
}

/// Offsets covering the real-world range of fixed zones
fn arb_offset() -> impl Strategy<Value = FixedOffset> {
    (-720i32..=840i32).prop_map(|minutes| FixedOffset::east_opt(minutes * 60).unwrap())
}

fn policy() -> CutoffPolicy {
    CutoffPolicy::new(FixedOffset::east_opt(0).unwrap(), 20)
}

// ============================================================================
// Per-delivery cutoff properties
// ============================================================================

proptest! {
    /// Property: the per-delivery lock never reopens as time advances
    #[test]
    fn prop_delivery_lock_is_monotonic(
        now in arb_instant(),
        delivery in arb_date(),
        advance_secs in 0i64..31_536_000i64
    ) {
        let p = policy();
        if p.is_locked_for_delivery(now, delivery) {
            let later = now + Duration::seconds(advance_secs);
            prop_assert!(p.is_locked_for_delivery(later, delivery));
        }
    }

    /// Property: a delivery more than a day out is never locked
    #[test]
    fn prop_far_future_delivery_unlocked(now in arb_instant(), days_out in 2i64..365i64) {
        let p = policy();
        let delivery = p.local_date(now) + Duration::days(days_out);
        prop_assert!(!p.is_locked_for_delivery(now, delivery));
    }

    /// Property: a delivery dated today or earlier is always locked
    #[test]
    fn prop_past_delivery_locked(now in arb_instant(), days_ago in 0i64..365i64) {
        let p = policy();
        let delivery = p.local_date(now) - Duration::days(days_ago);
        prop_assert!(p.is_locked_for_delivery(now, delivery));
    }

    /// Property: the lock decision agrees with the explicit boundary instant
    #[test]
    fn prop_lock_matches_boundary(
        now in arb_instant(),
        delivery in arb_date(),
        offset in arb_offset()
    ) {
        let p = CutoffPolicy::new(offset, 20);
        let boundary_local = (delivery - Duration::days(1)).and_hms_opt(20, 0, 0).unwrap();
        let boundary_utc = p.to_utc(boundary_local);
        prop_assert_eq!(p.is_locked_for_delivery(now, delivery), now >= boundary_utc);
    }
}

// ============================================================================
// Weekly lock properties
// ============================================================================

proptest! {
    /// Property: the weekly lock matches the weekday/hour rule exactly
    #[test]
    fn prop_weekly_lock_partition(now in arb_instant()) {
        let p = policy();
        let local = now.naive_utc();
        let expected = match local.weekday() {
            Weekday::Sat | Weekday::Sun => true,
            Weekday::Fri => local.hour() >= 20,
            _ => false,
        };
        prop_assert_eq!(p.is_weekly_locked(now), expected);
    }

    /// Property: the next unlock is a Monday midnight strictly after now,
    /// at most a week away
    #[test]
    fn prop_next_unlock_is_upcoming_monday(now in arb_instant()) {
        let p = policy();
        let unlock = p.next_weekly_unlock(now);

        prop_assert!(unlock > now);
        prop_assert!(unlock - now <= Duration::days(7));

        let local = unlock.naive_utc();
        prop_assert_eq!(local.weekday(), Weekday::Mon);
        prop_assert_eq!(local.time(), chrono::NaiveTime::MIN);
    }

    /// Property: the unlock instant itself is never weekly locked
    #[test]
    fn prop_unlock_instant_is_open(now in arb_instant()) {
        let p = policy();
        let unlock = p.next_weekly_unlock(now);
        prop_assert!(!p.is_weekly_locked(unlock));
    }

    /// Property: while locked, the second before the unlock is still locked
    #[test]
    fn prop_lock_holds_until_unlock(now in arb_instant()) {
        let p = policy();
        if p.is_weekly_locked(now) {
            let unlock = p.next_weekly_unlock(now);
            prop_assert!(p.is_weekly_locked(unlock - Duration::seconds(1)));
        }
    }

    /// Property: lock status carries a reopen instant exactly when locked
    #[test]
    fn prop_lock_status_consistent(now in arb_instant(), offset in arb_offset()) {
        let p = CutoffPolicy::new(offset, 20);
        let status = p.lock_status(now);
        prop_assert_eq!(status.locked, p.is_weekly_locked(now));
        prop_assert_eq!(status.next_available_at.is_some(), status.locked);
    }
}

// ============================================================================
// Schedule generation properties
// ============================================================================

fn subscription_for(user: UserId) -> Subscription {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
    Subscription {
        id: SubscriptionId::new(),
        user_id: user,
        chef_id: Some(ChefId::new()),
        plan_id: Some(PlanId::new()),
        plan_name: "Weekly Thali".to_string(),
        meals_per_week: 7,
        price_cents: 4500,
        price_snapshot_cents: 4500,
        address: Address::new("12 Curry Lane", "Pune", "411001"),
        status: SubscriptionStatus::Active,
        start_date: Some(now),
        next_billing_at: now,
        payment_order_ref: None,
        payment_ref: None,
        created_at: now,
        updated_at: now,
    }
}

proptest! {
    /// Property: any activation date yields 7 consecutive next-day entries
    #[test]
    fn prop_week_is_always_full_and_consecutive(start in arb_date()) {
        let sub = subscription_for(UserId::new());
        let batch = build_week(&sub, start, 7, MealType::Lunch);

        prop_assert_eq!(batch.len(), 7);
        for (i, entry) in batch.iter().enumerate() {
            prop_assert_eq!(entry.delivery_date, start + Duration::days(i as i64 + 1));
        }
    }

    /// Property: none of the generated entries is locked at activation time
    ///
    /// Scheduling starts tomorrow; at any activation instant before the
    /// evening cutoff the whole batch is still modifiable.
    #[test]
    fn prop_fresh_schedule_is_modifiable_before_cutoff(now in arb_instant()) {
        let p = policy();
        let local = now.naive_utc();
        prop_assume!(local.hour() < 20);

        let sub = subscription_for(UserId::new());
        let batch = build_week(&sub, p.local_date(now), 7, MealType::Lunch);
        for entry in &batch {
            prop_assert!(!p.is_locked_for_delivery(now, entry.delivery_date));
        }
    }
}
