//! Mock repositories for testing
//!
//! In-memory implementations that mirror the conditional-update
//! semantics of the PostgreSQL layer, including the partial unique
//! index on open subscriptions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use tiffin_core::{Notifier, NotifyError};
use tiffin_db::{
    ActivateSubscription, CreateDelivery, CreateSubscription, DbError, DbResult, DeliveryRepository,
    DeliveryRow, SubscriptionRepository, SubscriptionRow,
};
use tiffin_types::{Address, DeliveryStatus, Notification, SubscriptionStatus};

/// In-memory subscription repository for testing
#[derive(Default, Clone)]
pub struct MockSubscriptionRepository {
    subscriptions: Arc<DashMap<Uuid, SubscriptionRow>>,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a subscription row directly
    #[allow(dead_code)]
    pub fn insert(&self, row: SubscriptionRow) {
        self.subscriptions.insert(row.id, row);
    }

    /// Number of stored subscriptions
    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        Ok(self.subscriptions.get(&id).map(|r| r.value().clone()))
    }

    async fn find_open_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        Ok(self
            .subscriptions
            .iter()
            .find(|r| {
                r.value().user_id == user_id
                    && matches!(r.value().status.as_str(), "pending" | "active")
            })
            .map(|r| r.value().clone()))
    }

    async fn find_by_order_ref(&self, order_ref: &str) -> DbResult<Option<SubscriptionRow>> {
        Ok(self
            .subscriptions
            .iter()
            .find(|r| r.value().payment_order_ref.as_deref() == Some(order_ref))
            .map(|r| r.value().clone()))
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        // Mirror the partial unique index backstop.
        let duplicate = self.subscriptions.iter().any(|r| {
            r.value().user_id == sub.user_id
                && matches!(r.value().status.as_str(), "pending" | "active")
        });
        if duplicate {
            return Err(DbError::UniqueViolation);
        }

        let now = Utc::now();
        let row = SubscriptionRow {
            id: sub.id,
            user_id: sub.user_id,
            chef_id: sub.chef_id,
            plan_id: sub.plan_id,
            plan_name: sub.plan_name,
            meals_per_week: sub.meals_per_week,
            price_cents: sub.price_cents,
            price_snapshot_cents: sub.price_cents,
            street: sub.address.street,
            city: sub.address.city,
            postal_code: sub.address.postal_code,
            status: "pending".to_string(),
            start_date: None,
            next_billing_at: sub.next_billing_at,
            payment_order_ref: None,
            payment_ref: None,
            created_at: now,
            updated_at: now,
        };
        self.subscriptions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn set_payment_order_ref(
        &self,
        id: Uuid,
        order_ref: &str,
    ) -> DbResult<Option<SubscriptionRow>> {
        if let Some(mut row) = self.subscriptions.get_mut(&id) {
            if row.status == "pending" {
                row.payment_order_ref = Some(order_ref.to_string());
                row.updated_at = Utc::now();
                return Ok(Some(row.clone()));
            }
        }
        Ok(None)
    }

    async fn activate(
        &self,
        activation: ActivateSubscription,
    ) -> DbResult<Option<SubscriptionRow>> {
        if let Some(mut row) = self.subscriptions.get_mut(&activation.id) {
            if row.status == "pending" {
                row.status = "active".to_string();
                row.payment_ref = Some(activation.payment_ref);
                row.start_date = Some(activation.start_date);
                row.next_billing_at = activation.next_billing_at;
                row.updated_at = Utc::now();
                return Ok(Some(row.clone()));
            }
        }
        Ok(None)
    }

    async fn set_status(
        &self,
        id: Uuid,
        expected: SubscriptionStatus,
        new: SubscriptionStatus,
    ) -> DbResult<Option<SubscriptionRow>> {
        if let Some(mut row) = self.subscriptions.get_mut(&id) {
            if row.status == expected.as_str() {
                row.status = new.as_str().to_string();
                row.updated_at = Utc::now();
                return Ok(Some(row.clone()));
            }
        }
        Ok(None)
    }

    async fn resume(
        &self,
        id: Uuid,
        next_billing_at: DateTime<Utc>,
    ) -> DbResult<Option<SubscriptionRow>> {
        if let Some(mut row) = self.subscriptions.get_mut(&id) {
            if row.status == "paused" {
                row.status = "active".to_string();
                row.next_billing_at = next_billing_at;
                row.updated_at = Utc::now();
                return Ok(Some(row.clone()));
            }
        }
        Ok(None)
    }

    async fn cancel(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        if let Some(mut row) = self.subscriptions.get_mut(&id) {
            if matches!(row.status.as_str(), "pending" | "active" | "paused") {
                row.status = "cancelled".to_string();
                row.updated_at = Utc::now();
                return Ok(Some(row.clone()));
            }
        }
        Ok(None)
    }

    async fn update_address(
        &self,
        id: Uuid,
        address: &Address,
    ) -> DbResult<Option<SubscriptionRow>> {
        if let Some(mut row) = self.subscriptions.get_mut(&id) {
            row.street = address.street.clone();
            row.city = address.city.clone();
            row.postal_code = address.postal_code.clone();
            row.updated_at = Utc::now();
            return Ok(Some(row.clone()));
        }
        Ok(None)
    }
}

/// In-memory delivery repository for testing
#[derive(Default, Clone)]
pub struct MockDeliveryRepository {
    deliveries: Arc<DashMap<Uuid, DeliveryRow>>,
}

impl MockDeliveryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a delivery row directly
    #[allow(dead_code)]
    pub fn insert(&self, row: DeliveryRow) {
        self.deliveries.insert(row.id, row);
    }

    /// Number of stored deliveries
    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.deliveries.len()
    }
}

#[async_trait]
impl DeliveryRepository for MockDeliveryRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DeliveryRow>> {
        Ok(self.deliveries.get(&id).map(|r| r.value().clone()))
    }

    async fn list_by_subscription(&self, subscription_id: Uuid) -> DbResult<Vec<DeliveryRow>> {
        let mut rows: Vec<DeliveryRow> = self
            .deliveries
            .iter()
            .filter(|r| r.value().subscription_id == subscription_id)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| r.delivery_date);
        Ok(rows)
    }

    async fn create_batch(&self, deliveries: Vec<CreateDelivery>) -> DbResult<Vec<DeliveryRow>> {
        let now = Utc::now();
        let mut rows = Vec::with_capacity(deliveries.len());
        for d in deliveries {
            let row = DeliveryRow {
                id: d.id,
                subscription_id: d.subscription_id,
                user_id: d.user_id,
                chef_id: d.chef_id,
                delivery_date: d.delivery_date,
                street: d.address.street,
                city: d.address.city,
                postal_code: d.address.postal_code,
                meal_type: d.meal_type.as_str().to_string(),
                status: "scheduled".to_string(),
                delivered_at: None,
                created_at: now,
                updated_at: now,
            };
            self.deliveries.insert(row.id, row.clone());
            rows.push(row);
        }
        Ok(rows)
    }

    async fn set_status(
        &self,
        id: Uuid,
        expected: DeliveryStatus,
        new: DeliveryStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> DbResult<Option<DeliveryRow>> {
        if let Some(mut row) = self.deliveries.get_mut(&id) {
            if row.status == expected.as_str() {
                row.status = new.as_str().to_string();
                if delivered_at.is_some() {
                    row.delivered_at = delivered_at;
                }
                row.updated_at = Utc::now();
                return Ok(Some(row.clone()));
            }
        }
        Ok(None)
    }

    async fn update_address_if_scheduled(
        &self,
        id: Uuid,
        address: &Address,
    ) -> DbResult<Option<DeliveryRow>> {
        if let Some(mut row) = self.deliveries.get_mut(&id) {
            if row.status == "scheduled" {
                row.street = address.street.clone();
                row.city = address.city.clone();
                row.postal_code = address.postal_code.clone();
                row.updated_at = Utc::now();
                return Ok(Some(row.clone()));
            }
        }
        Ok(None)
    }
}

/// Notifier that records every emitted event
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Notifier that always fails, for log-and-continue checks
#[derive(Default, Clone, Copy)]
#[allow(dead_code)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Err(NotifyError("sink unavailable".to_string()))
    }
}
