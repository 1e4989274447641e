//! Subscription lifecycle
//!
//! State machine over a subscription's status, from plan selection to
//! cancellation:
//!
//! ```text
//! (create) -> pending -> active <-> paused
//!                 \         \        /
//!                  +------ cancelled (terminal)
//! ```
//!
//! Activation happens only through a confirmed payment event and is
//! idempotent: replaying the same confirmation returns the already
//! active subscription without scheduling a second delivery batch.

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use tiffin_db::{
    ActivateSubscription, CreateSubscription, DeliveryRepository, SubscriptionRepository,
    SubscriptionRow,
};
use tiffin_types::{
    Address, ChefId, Delivery, Notification, NotificationKind, PlanId, Subscription,
    SubscriptionId, SubscriptionStatus, UserId,
};

use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::cutoff::{CutoffPolicy, LockStatus};
use crate::error::CoreError;
use crate::notify::Notifier;
use crate::schedule::build_week;

/// Input for creating a pending subscription
///
/// Arrives pre-validated for shape at the HTTP boundary; the service
/// still enforces the domain rules (positive price, complete address).
#[derive(Debug, Clone)]
pub struct NewSubscription {
    /// Subscribing customer
    pub user_id: UserId,
    /// Chef the plan belongs to, if assigned
    pub chef_id: Option<ChefId>,
    /// Plan the customer selected
    pub plan_id: Option<PlanId>,
    /// Plan name, snapshotted onto the subscription
    pub plan_name: String,
    /// Meals delivered per week
    pub meals_per_week: i32,
    /// Price in minor currency units
    pub price_cents: i64,
    /// Delivery address, snapshotted onto the subscription
    pub address: Address,
}

/// Subscription lifecycle service
///
/// Owns every status transition of a subscription. All writes go
/// through status-guarded conditional updates so concurrent callers
/// observe `Conflict` instead of clobbering each other.
pub struct SubscriptionService<S, D, N> {
    subscriptions: Arc<S>,
    deliveries: Arc<D>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    cutoff: CutoffPolicy,
    config: CoreConfig,
}

impl<S, D, N> SubscriptionService<S, D, N>
where
    S: SubscriptionRepository,
    D: DeliveryRepository,
    N: Notifier,
{
    /// Create a new lifecycle service
    pub fn new(
        config: CoreConfig,
        subscriptions: Arc<S>,
        deliveries: Arc<D>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            cutoff: config.cutoff_policy(),
            subscriptions,
            deliveries,
            notifier,
            clock,
            config,
        }
    }

    /// Create a pending subscription for a customer
    ///
    /// At most one pending-or-active subscription may exist per user.
    /// The lookup here is the fast-path reject; the partial unique
    /// index behind `create` is the backstop against two concurrent
    /// creations racing past the check.
    pub async fn create_pending(&self, input: NewSubscription) -> Result<Subscription, CoreError> {
        if input.plan_name.trim().is_empty() {
            return Err(CoreError::BadInput("plan name is required".to_string()));
        }
        if input.meals_per_week < 1 {
            return Err(CoreError::BadInput(
                "meals per week must be at least 1".to_string(),
            ));
        }
        if input.price_cents <= 0 {
            return Err(CoreError::BadInput("price must be positive".to_string()));
        }
        if !input.address.is_complete() {
            return Err(CoreError::BadInput(
                "delivery address is incomplete".to_string(),
            ));
        }

        if self
            .subscriptions
            .find_open_by_user_id(input.user_id.0)
            .await?
            .is_some()
        {
            return Err(CoreError::Conflict(
                "an active or pending subscription already exists for this user".to_string(),
            ));
        }

        let now = self.clock.now();
        let tomorrow = self.cutoff.local_date(now) + Duration::days(1);
        let next_billing_at = self
            .cutoff
            .to_utc(tomorrow.and_hms_opt(0, 0, 0).expect("midnight is valid"));

        let row = self
            .subscriptions
            .create(CreateSubscription {
                id: Uuid::new_v4(),
                user_id: input.user_id.0,
                chef_id: input.chef_id.map(|c| c.0),
                plan_id: input.plan_id.map(|p| p.0),
                plan_name: input.plan_name,
                meals_per_week: input.meals_per_week,
                price_cents: input.price_cents,
                address: input.address,
                next_billing_at,
            })
            .await?;

        tracing::info!(
            subscription_id = %row.id,
            user_id = %row.user_id,
            "Pending subscription created"
        );

        Ok(row.into_subscription())
    }

    /// Attach an external payment order reference to a pending subscription
    pub async fn attach_payment_order(
        &self,
        id: SubscriptionId,
        order_ref: &str,
    ) -> Result<Subscription, CoreError> {
        if order_ref.trim().is_empty() {
            return Err(CoreError::BadInput(
                "payment order reference is required".to_string(),
            ));
        }

        match self
            .subscriptions
            .set_payment_order_ref(id.0, order_ref)
            .await?
        {
            Some(row) => Ok(row.into_subscription()),
            None => {
                // Distinguish a missing row from a non-pending one.
                match self.subscriptions.find_by_id(id.0).await? {
                    Some(_) => Err(CoreError::Conflict(
                        "payment orders can only be attached while pending".to_string(),
                    )),
                    None => Err(CoreError::NotFound),
                }
            }
        }
    }

    /// Activate a subscription from a confirmed payment event
    ///
    /// Idempotent: a replayed confirmation for an already active
    /// subscription returns it unchanged and schedules nothing.
    pub async fn confirm_payment(
        &self,
        order_ref: &str,
        payment_ref: &str,
    ) -> Result<Subscription, CoreError> {
        if order_ref.trim().is_empty() || payment_ref.trim().is_empty() {
            return Err(CoreError::BadInput(
                "payment references are required".to_string(),
            ));
        }

        let row = self
            .subscriptions
            .find_by_order_ref(order_ref)
            .await?
            .ok_or(CoreError::NotFound)?;

        match row.parsed_status() {
            Some(SubscriptionStatus::Active) => {
                tracing::info!(
                    subscription_id = %row.id,
                    "Replayed payment confirmation for active subscription"
                );
                return Ok(row.into_subscription());
            }
            Some(SubscriptionStatus::Pending) => {}
            _ => {
                return Err(CoreError::Conflict(format!(
                    "cannot confirm payment on a {} subscription",
                    row.status
                )));
            }
        }

        let now = self.clock.now();
        let activated = match self
            .subscriptions
            .activate(ActivateSubscription {
                id: row.id,
                payment_ref: payment_ref.to_string(),
                start_date: now,
                next_billing_at: now + Duration::days(self.config.billing_period_days),
            })
            .await?
        {
            Some(row) => row,
            None => {
                // Lost the activation race; a concurrent confirmation
                // of the same order may already have won.
                let current = self
                    .subscriptions
                    .find_by_id(row.id)
                    .await?
                    .ok_or(CoreError::NotFound)?;
                if current.parsed_status() == Some(SubscriptionStatus::Active) {
                    return Ok(current.into_subscription());
                }
                return Err(CoreError::Conflict(
                    "subscription state changed during payment confirmation".to_string(),
                ));
            }
        };

        let subscription = activated.into_subscription();

        let batch = build_week(
            &subscription,
            self.cutoff.local_date(now),
            self.config.delivery_horizon_days,
            self.config.default_meal_type,
        );
        let scheduled = self.deliveries.create_batch(batch).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            deliveries = scheduled.len(),
            "Subscription activated"
        );

        self.emit(Notification {
            recipient: subscription.user_id.0,
            kind: NotificationKind::SubscriptionActivated,
            title: "Subscription active".to_string(),
            message: format!(
                "Your {} subscription is active. Deliveries start tomorrow.",
                subscription.plan_name
            ),
            metadata: None,
        })
        .await;

        if let Some(chef_id) = subscription.chef_id {
            self.emit(Notification {
                recipient: chef_id.0,
                kind: NotificationKind::SubscriptionActivated,
                title: "New subscriber".to_string(),
                message: format!(
                    "A new {} subscription starts tomorrow.",
                    subscription.plan_name
                ),
                metadata: None,
            })
            .await;
        }

        Ok(subscription)
    }

    /// Pause an active subscription
    pub async fn pause(
        &self,
        id: SubscriptionId,
        actor: UserId,
    ) -> Result<Subscription, CoreError> {
        let row = self.fetch_owned(id, actor).await?;

        match self
            .subscriptions
            .set_status(id.0, SubscriptionStatus::Active, SubscriptionStatus::Paused)
            .await?
        {
            Some(updated) => Ok(updated.into_subscription()),
            None => Err(CoreError::Conflict(format!(
                "cannot pause a {} subscription",
                row.status
            ))),
        }
    }

    /// Resume a paused subscription, re-anchoring the billing date
    pub async fn resume(
        &self,
        id: SubscriptionId,
        actor: UserId,
    ) -> Result<Subscription, CoreError> {
        let row = self.fetch_owned(id, actor).await?;

        if row.parsed_status() != Some(SubscriptionStatus::Paused) {
            return Err(CoreError::BadInput(format!(
                "cannot resume a {} subscription",
                row.status
            )));
        }

        let next_billing_at = self.clock.now() + Duration::days(self.config.billing_period_days);
        match self.subscriptions.resume(id.0, next_billing_at).await? {
            Some(updated) => Ok(updated.into_subscription()),
            None => Err(CoreError::Conflict(
                "subscription state changed during resume".to_string(),
            )),
        }
    }

    /// Cancel a subscription
    ///
    /// Legal from pending, active and paused; `cancelled` is terminal,
    /// so repeating the call conflicts.
    pub async fn cancel(
        &self,
        id: SubscriptionId,
        actor: UserId,
    ) -> Result<Subscription, CoreError> {
        self.fetch_owned(id, actor).await?;

        match self.subscriptions.cancel(id.0).await? {
            Some(updated) => {
                tracing::info!(subscription_id = %id, "Subscription cancelled");
                Ok(updated.into_subscription())
            }
            None => Err(CoreError::Conflict(
                "subscription is already cancelled".to_string(),
            )),
        }
    }

    /// Update the subscription's delivery address snapshot
    ///
    /// Guarded by the weekly lock window; a rejection carries the
    /// instant the window reopens.
    pub async fn update_address(
        &self,
        id: SubscriptionId,
        actor: UserId,
        address: Address,
    ) -> Result<Subscription, CoreError> {
        self.fetch_owned(id, actor).await?;

        let now = self.clock.now();
        if self.cutoff.is_weekly_locked(now) {
            return Err(CoreError::Locked {
                next_available_at: Some(self.cutoff.next_weekly_unlock(now)),
            });
        }

        if !address.is_complete() {
            return Err(CoreError::BadInput(
                "delivery address is incomplete".to_string(),
            ));
        }

        self.subscriptions
            .update_address(id.0, &address)
            .await?
            .map(SubscriptionRow::into_subscription)
            .ok_or(CoreError::NotFound)
    }

    /// Fetch a subscription, owner-scoped
    pub async fn get(&self, id: SubscriptionId, actor: UserId) -> Result<Subscription, CoreError> {
        Ok(self.fetch_owned(id, actor).await?.into_subscription())
    }

    /// List the deliveries scheduled under a subscription, owner-scoped
    pub async fn list_deliveries(
        &self,
        id: SubscriptionId,
        actor: UserId,
    ) -> Result<Vec<Delivery>, CoreError> {
        self.fetch_owned(id, actor).await?;

        let rows = self.deliveries.list_by_subscription(id.0).await?;
        Ok(rows.into_iter().map(|r| r.into_delivery()).collect())
    }

    /// Current weekly lock state, for unauthenticated clients
    pub fn lock_status(&self) -> LockStatus {
        self.cutoff.lock_status(self.clock.now())
    }

    async fn fetch_owned(
        &self,
        id: SubscriptionId,
        actor: UserId,
    ) -> Result<SubscriptionRow, CoreError> {
        let row = self
            .subscriptions
            .find_by_id(id.0)
            .await?
            .ok_or(CoreError::NotFound)?;

        if row.user_id != actor.0 {
            return Err(CoreError::Forbidden);
        }

        Ok(row)
    }

    async fn emit(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(notification).await {
            tracing::warn!("Failed to deliver notification: {}", e);
        }
    }
}
