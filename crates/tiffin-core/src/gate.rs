//! Delivery modification gate
//!
//! Authorizes and applies the three per-delivery operations: a customer
//! skipping a meal, a customer redirecting a meal to another address,
//! and a chef marking a meal delivered.
//!
//! Every transition is a status-guarded conditional update. When the
//! guard loses a race the delivery is re-read: if it already sits in
//! the requested target state the retry is reported as success, any
//! other state is a conflict.

use std::sync::Arc;

use tiffin_db::{DeliveryRepository, DeliveryRow};
use tiffin_types::{
    Address, ChefId, Delivery, DeliveryId, DeliveryStatus, Notification, NotificationKind, UserId,
};

use crate::clock::Clock;
use crate::cutoff::CutoffPolicy;
use crate::error::CoreError;
use crate::notify::Notifier;

/// Per-delivery authorization and mutation service
pub struct DeliveryService<D, N> {
    deliveries: Arc<D>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    cutoff: CutoffPolicy,
}

impl<D, N> DeliveryService<D, N>
where
    D: DeliveryRepository,
    N: Notifier,
{
    /// Create a new delivery service
    pub fn new(
        cutoff: CutoffPolicy,
        deliveries: Arc<D>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            deliveries,
            notifier,
            clock,
            cutoff,
        }
    }

    /// Skip a scheduled delivery
    ///
    /// Customer-only, rejected once the per-delivery cutoff has passed.
    /// Retrying an already skipped delivery is a no-op success.
    pub async fn skip(&self, id: DeliveryId, actor: UserId) -> Result<Delivery, CoreError> {
        let row = self.fetch_for_customer(id, actor).await?;

        match row.parsed_status() {
            Some(DeliveryStatus::Skipped) => {
                tracing::debug!(delivery_id = %id, "Skip replayed on skipped delivery");
                return Ok(row.into_delivery());
            }
            Some(DeliveryStatus::Delivered) => {
                return Err(CoreError::Conflict(
                    "delivery has already been completed".to_string(),
                ));
            }
            _ => {}
        }

        self.check_delivery_cutoff(&row)?;

        let updated = match self
            .deliveries
            .set_status(
                id.0,
                DeliveryStatus::Scheduled,
                DeliveryStatus::Skipped,
                None,
            )
            .await?
        {
            Some(row) => row,
            None => return self.resolve_lost_race(id, DeliveryStatus::Skipped).await,
        };

        tracing::info!(delivery_id = %id, date = %updated.delivery_date, "Delivery skipped");

        if let Some(chef_id) = updated.chef_id {
            self.emit(Notification {
                recipient: chef_id,
                kind: NotificationKind::DeliverySkipped,
                title: "Delivery skipped".to_string(),
                message: format!("The delivery on {} was skipped.", updated.delivery_date),
                metadata: None,
            })
            .await;
        }

        Ok(updated.into_delivery())
    }

    /// Redirect a scheduled delivery to a different address
    ///
    /// Mutates only this delivery's snapshot, never the parent
    /// subscription. Last write wins between address changes, but a
    /// concurrent skip and address change cannot both succeed.
    pub async fn change_address(
        &self,
        id: DeliveryId,
        actor: UserId,
        address: Address,
    ) -> Result<Delivery, CoreError> {
        let row = self.fetch_for_customer(id, actor).await?;

        if row.parsed_status() != Some(DeliveryStatus::Scheduled) {
            return Err(CoreError::Conflict(format!(
                "cannot change the address of a {} delivery",
                row.status
            )));
        }

        self.check_delivery_cutoff(&row)?;

        if !address.is_complete() {
            return Err(CoreError::BadInput(
                "delivery address is incomplete".to_string(),
            ));
        }

        let updated = match self
            .deliveries
            .update_address_if_scheduled(id.0, &address)
            .await?
        {
            Some(row) => row,
            None => {
                return Err(CoreError::Conflict(
                    "delivery was modified concurrently".to_string(),
                ));
            }
        };

        if let Some(chef_id) = updated.chef_id {
            self.emit(Notification {
                recipient: chef_id,
                kind: NotificationKind::DeliveryAddressChanged,
                title: "Delivery address changed".to_string(),
                message: format!(
                    "The delivery on {} goes to a new address: {}.",
                    updated.delivery_date, address
                ),
                metadata: None,
            })
            .await;
        }

        Ok(updated.into_delivery())
    }

    /// Mark a delivery as handed over
    ///
    /// Chef-only, with no time restriction while still scheduled.
    /// Retrying an already delivered delivery is a no-op success.
    pub async fn mark_delivered(
        &self,
        id: DeliveryId,
        actor: ChefId,
    ) -> Result<Delivery, CoreError> {
        let row = self
            .deliveries
            .find_by_id(id.0)
            .await?
            .ok_or(CoreError::NotFound)?;

        if row.chef_id != Some(actor.0) {
            return Err(CoreError::Forbidden);
        }

        match row.parsed_status() {
            Some(DeliveryStatus::Delivered) => {
                tracing::debug!(delivery_id = %id, "Deliver replayed on delivered delivery");
                return Ok(row.into_delivery());
            }
            Some(DeliveryStatus::Skipped) => {
                return Err(CoreError::Conflict(
                    "delivery was skipped by the customer".to_string(),
                ));
            }
            _ => {}
        }

        let now = self.clock.now();
        let updated = match self
            .deliveries
            .set_status(
                id.0,
                DeliveryStatus::Scheduled,
                DeliveryStatus::Delivered,
                Some(now),
            )
            .await?
        {
            Some(row) => row,
            None => return self.resolve_lost_race(id, DeliveryStatus::Delivered).await,
        };

        tracing::info!(delivery_id = %id, date = %updated.delivery_date, "Delivery completed");

        self.emit(Notification {
            recipient: updated.user_id,
            kind: NotificationKind::DeliveryCompleted,
            title: "Meal delivered".to_string(),
            message: format!("Your meal for {} has been delivered.", updated.delivery_date),
            metadata: None,
        })
        .await;

        Ok(updated.into_delivery())
    }

    /// Fetch a delivery and require the acting customer to own it
    async fn fetch_for_customer(
        &self,
        id: DeliveryId,
        actor: UserId,
    ) -> Result<DeliveryRow, CoreError> {
        let row = self
            .deliveries
            .find_by_id(id.0)
            .await?
            .ok_or(CoreError::NotFound)?;

        if row.user_id != actor.0 {
            return Err(CoreError::Forbidden);
        }

        Ok(row)
    }

    /// Reject the modification once the per-delivery cutoff has passed
    ///
    /// This boundary is monotonic, so there is no reopening instant to
    /// report.
    fn check_delivery_cutoff(&self, row: &DeliveryRow) -> Result<(), CoreError> {
        if self
            .cutoff
            .is_locked_for_delivery(self.clock.now(), row.delivery_date)
        {
            return Err(CoreError::Locked {
                next_available_at: None,
            });
        }
        Ok(())
    }

    /// A conditional update matched no row: re-read and decide
    ///
    /// A concurrent writer got there first. If it drove the delivery to
    /// the state this caller wanted anyway, report success; otherwise
    /// surface the conflict.
    async fn resolve_lost_race(
        &self,
        id: DeliveryId,
        wanted: DeliveryStatus,
    ) -> Result<Delivery, CoreError> {
        let current = self
            .deliveries
            .find_by_id(id.0)
            .await?
            .ok_or(CoreError::NotFound)?;

        if current.parsed_status() == Some(wanted) {
            tracing::debug!(delivery_id = %id, status = %current.status, "Lost race to same state");
            return Ok(current.into_delivery());
        }

        Err(CoreError::Conflict(format!(
            "delivery was concurrently moved to {}",
            current.status
        )))
    }

    async fn emit(&self, notification: Notification) {
        if let Err(e) = self.notifier.notify(notification).await {
            tracing::warn!("Failed to deliver notification: {}", e);
        }
    }
}
