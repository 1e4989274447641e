//! Delivery schedule generator
//!
//! A confirmed payment schedules one week of deliveries up front. There
//! is no recurring restock job; the horizon is fixed at activation.

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use tiffin_db::CreateDelivery;
use tiffin_types::{MealType, Subscription};

/// Build the activation batch: one delivery per day for the horizon,
/// starting the day after `activation_date`.
///
/// Each entry copies the subscription's current address; the copies
/// mutate independently afterwards.
pub fn build_week(
    subscription: &Subscription,
    activation_date: NaiveDate,
    horizon_days: u32,
    meal_type: MealType,
) -> Vec<CreateDelivery> {
    (1..=i64::from(horizon_days))
        .map(|day| CreateDelivery {
            id: Uuid::new_v4(),
            subscription_id: subscription.id.0,
            user_id: subscription.user_id.0,
            chef_id: subscription.chef_id.map(|c| c.0),
            delivery_date: activation_date + Duration::days(day),
            address: subscription.address.clone(),
            meal_type,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use tiffin_types::{
        Address, ChefId, PlanId, SubscriptionId, SubscriptionStatus, UserId,
    };

    fn subscription() -> Subscription {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        Subscription {
            id: SubscriptionId::new(),
            user_id: UserId::new(),
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
            payment_order_ref: Some("order_123".to_string()),
            payment_ref: Some("pay_456".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_builds_exactly_seven_entries() {
        let sub = subscription();
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let batch = build_week(&sub, start, 7, MealType::Lunch);
        assert_eq!(batch.len(), 7);
    }

    #[test]
    fn test_dates_are_consecutive_starting_tomorrow() {
        let sub = subscription();
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let batch = build_week(&sub, start, 7, MealType::Lunch);

        for (i, entry) in batch.iter().enumerate() {
            let expected = start + Duration::days(i as i64 + 1);
            assert_eq!(entry.delivery_date, expected);
        }
        assert_eq!(
            batch.last().unwrap().delivery_date,
            NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
        );
    }

    #[test]
    fn test_entries_inherit_subscription_snapshot() {
        let sub = subscription();
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let batch = build_week(&sub, start, 7, MealType::Dinner);

        for entry in &batch {
            assert_eq!(entry.subscription_id, sub.id.0);
            assert_eq!(entry.user_id, sub.user_id.0);
            assert_eq!(entry.chef_id, sub.chef_id.map(|c| c.0));
            assert_eq!(entry.address, sub.address);
            assert_eq!(entry.meal_type, MealType::Dinner);
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let sub = subscription();
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let batch = build_week(&sub, start, 7, MealType::Lunch);

        let mut ids: Vec<_> = batch.iter().map(|d| d.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn test_month_boundary_rollover() {
        let sub = subscription();
        let start = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let batch = build_week(&sub, start, 7, MealType::Lunch);

        // 2024 is a leap year: Feb 29 exists.
        assert_eq!(
            batch[0].delivery_date,
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            batch[6].delivery_date,
            NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()
        );
    }
}
