//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use tiffin_types::{
    Address, ChefId, Delivery, DeliveryId, DeliveryStatus, MealType, PlanId, Subscription,
    SubscriptionId, SubscriptionStatus, UserId,
};

/// Subscription row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub chef_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    pub plan_name: String,
    pub meals_per_week: i32,
    pub price_cents: i64,
    pub price_snapshot_cents: i64,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub status: String,
    pub start_date: Option<DateTime<Utc>>,
    pub next_billing_at: DateTime<Utc>,
    pub payment_order_ref: Option<String>,
    pub payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Delivery row from the database
#[derive(Debug, Clone, FromRow)]
pub struct DeliveryRow {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub chef_id: Option<Uuid>,
    pub delivery_date: NaiveDate,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub meal_type: String,
    pub status: String,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Conversion implementations from row types to tiffin-types domain types

impl SubscriptionRow {
    /// Convert to domain SubscriptionId
    pub fn subscription_id(&self) -> SubscriptionId {
        SubscriptionId(self.id)
    }

    /// Convert to domain UserId
    pub fn user_id(&self) -> UserId {
        UserId(self.user_id)
    }

    /// Parse the status column
    ///
    /// Rows are only ever written with `SubscriptionStatus::as_str`
    /// values, so a parse failure means a corrupted row.
    pub fn parsed_status(&self) -> Option<SubscriptionStatus> {
        self.status.parse().ok()
    }

    /// Convert to the domain subscription type
    pub fn into_subscription(self) -> Subscription {
        let status = self
            .status
            .parse()
            .unwrap_or(SubscriptionStatus::Cancelled);
        Subscription {
            id: SubscriptionId(self.id),
            user_id: UserId(self.user_id),
            chef_id: self.chef_id.map(ChefId),
            plan_id: self.plan_id.map(PlanId),
            plan_name: self.plan_name,
            meals_per_week: self.meals_per_week,
            price_cents: self.price_cents,
            price_snapshot_cents: self.price_snapshot_cents,
            address: Address {
                street: self.street,
                city: self.city,
                postal_code: self.postal_code,
            },
            status,
            start_date: self.start_date,
            next_billing_at: self.next_billing_at,
            payment_order_ref: self.payment_order_ref,
            payment_ref: self.payment_ref,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl DeliveryRow {
    /// Convert to domain DeliveryId
    pub fn delivery_id(&self) -> DeliveryId {
        DeliveryId(self.id)
    }

    /// Convert to domain UserId
    pub fn user_id(&self) -> UserId {
        UserId(self.user_id)
    }

    /// Convert to domain ChefId
    pub fn chef_id(&self) -> Option<ChefId> {
        self.chef_id.map(ChefId)
    }

    /// Parse the status column
    pub fn parsed_status(&self) -> Option<DeliveryStatus> {
        self.status.parse().ok()
    }

    /// Convert to the domain delivery type
    pub fn into_delivery(self) -> Delivery {
        let status = self.status.parse().unwrap_or(DeliveryStatus::Scheduled);
        let meal_type = self.meal_type.parse().unwrap_or_default();
        Delivery {
            id: DeliveryId(self.id),
            subscription_id: SubscriptionId(self.subscription_id),
            user_id: UserId(self.user_id),
            chef_id: self.chef_id.map(ChefId),
            delivery_date: self.delivery_date,
            address: Address {
                street: self.street,
                city: self.city,
                postal_code: self.postal_code,
            },
            meal_type,
            status,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
