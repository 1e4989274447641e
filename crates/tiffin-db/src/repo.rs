//! Repository traits
//!
//! Define async repository interfaces for database operations.
//!
//! Status-changing updates are conditional: they carry the expected
//! current status and return `None` when the row has moved on, so the
//! caller observes lost compare-and-swap races instead of clobbering a
//! concurrent writer.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use tiffin_types::{Address, DeliveryStatus, MealType, SubscriptionStatus};

use crate::error::DbResult;
use crate::models::{DeliveryRow, SubscriptionRow};

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find the user's open (pending or active) subscription, if any
    async fn find_open_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find a subscription by its external payment order reference
    async fn find_by_order_ref(&self, order_ref: &str) -> DbResult<Option<SubscriptionRow>>;

    /// Create a new pending subscription
    ///
    /// The one-open-subscription-per-user index is the backstop here;
    /// a violation surfaces as `DbError::UniqueViolation`.
    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow>;

    /// Attach an external payment order reference while still pending
    async fn set_payment_order_ref(
        &self,
        id: Uuid,
        order_ref: &str,
    ) -> DbResult<Option<SubscriptionRow>>;

    /// Activate a pending subscription
    ///
    /// Conditional on the row still being `pending`; the CAS loser
    /// (e.g. a replayed payment event) gets `None`.
    async fn activate(&self, activation: ActivateSubscription) -> DbResult<Option<SubscriptionRow>>;

    /// Move a subscription between statuses, conditional on the expected one
    async fn set_status(
        &self,
        id: Uuid,
        expected: SubscriptionStatus,
        new: SubscriptionStatus,
    ) -> DbResult<Option<SubscriptionRow>>;

    /// Resume a paused subscription, re-anchoring the billing date
    async fn resume(
        &self,
        id: Uuid,
        next_billing_at: DateTime<Utc>,
    ) -> DbResult<Option<SubscriptionRow>>;

    /// Cancel a subscription from any non-terminal status
    async fn cancel(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Overwrite the subscription's delivery address snapshot
    async fn update_address(&self, id: Uuid, address: &Address)
        -> DbResult<Option<SubscriptionRow>>;
}

/// Create subscription input
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub chef_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    pub plan_name: String,
    pub meals_per_week: i32,
    pub price_cents: i64,
    pub address: Address,
    pub next_billing_at: DateTime<Utc>,
}

/// Activation input for a pending subscription
#[derive(Debug, Clone)]
pub struct ActivateSubscription {
    pub id: Uuid,
    pub payment_ref: String,
    pub start_date: DateTime<Utc>,
    pub next_billing_at: DateTime<Utc>,
}

/// Delivery repository trait
#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    /// Find a delivery by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DeliveryRow>>;

    /// List all deliveries for a subscription, soonest first
    async fn list_by_subscription(&self, subscription_id: Uuid) -> DbResult<Vec<DeliveryRow>>;

    /// Insert a batch of scheduled deliveries
    async fn create_batch(&self, deliveries: Vec<CreateDelivery>) -> DbResult<Vec<DeliveryRow>>;

    /// Move a delivery between statuses, conditional on the expected one
    ///
    /// `delivered_at` is written only when provided (the delivered
    /// transition); skip leaves it null.
    async fn set_status(
        &self,
        id: Uuid,
        expected: DeliveryStatus,
        new: DeliveryStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> DbResult<Option<DeliveryRow>>;

    /// Overwrite the delivery's address snapshot while still scheduled
    ///
    /// Conditional on `scheduled` so a concurrent skip and address
    /// change cannot both win.
    async fn update_address_if_scheduled(
        &self,
        id: Uuid,
        address: &Address,
    ) -> DbResult<Option<DeliveryRow>>;
}

/// Create delivery input
#[derive(Debug, Clone)]
pub struct CreateDelivery {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub user_id: Uuid,
    pub chef_id: Option<Uuid>,
    pub delivery_date: NaiveDate,
    pub address: Address,
    pub meal_type: MealType,
}
