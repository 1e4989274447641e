//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tiffin_types::{Address, SubscriptionStatus};

use crate::error::DbResult;
use crate::models::SubscriptionRow;
use crate::repo::{ActivateSubscription, CreateSubscription, SubscriptionRepository};

const SUBSCRIPTION_COLUMNS: &str = r#"id, user_id, chef_id, plan_id, plan_name, meals_per_week,
       price_cents, price_snapshot_cents, street, city, postal_code, status,
       start_date, next_billing_at, payment_order_ref, payment_ref,
       created_at, updated_at"#;

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_open_by_user_id(&self, user_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"
            SELECT {SUBSCRIPTION_COLUMNS}
            FROM subscriptions
            WHERE user_id = $1 AND status IN ('pending', 'active')
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_by_order_ref(&self, order_ref: &str) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE payment_order_ref = $1"
        ))
        .bind(order_ref)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        // price_snapshot_cents is written once here and never updated.
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"
            INSERT INTO subscriptions (id, user_id, chef_id, plan_id, plan_name, meals_per_week,
                                       price_cents, price_snapshot_cents, street, city, postal_code,
                                       status, next_billing_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8, $9, $10, 'pending', $11)
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(sub.id)
        .bind(sub.user_id)
        .bind(sub.chef_id)
        .bind(sub.plan_id)
        .bind(&sub.plan_name)
        .bind(sub.meals_per_week)
        .bind(sub.price_cents)
        .bind(&sub.address.street)
        .bind(&sub.address.city)
        .bind(&sub.address.postal_code)
        .bind(sub.next_billing_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn set_payment_order_ref(
        &self,
        id: Uuid,
        order_ref: &str,
    ) -> DbResult<Option<SubscriptionRow>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"
            UPDATE subscriptions
            SET payment_order_ref = $1, updated_at = NOW()
            WHERE id = $2 AND status = 'pending'
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(order_ref)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn activate(
        &self,
        activation: ActivateSubscription,
    ) -> DbResult<Option<SubscriptionRow>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"
            UPDATE subscriptions
            SET status = 'active', payment_ref = $1, start_date = $2,
                next_billing_at = $3, updated_at = NOW()
            WHERE id = $4 AND status = 'pending'
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(&activation.payment_ref)
        .bind(activation.start_date)
        .bind(activation.next_billing_at)
        .bind(activation.id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn set_status(
        &self,
        id: Uuid,
        expected: SubscriptionStatus,
        new: SubscriptionStatus,
    ) -> DbResult<Option<SubscriptionRow>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"
            UPDATE subscriptions
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = $3
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(new.as_str())
        .bind(id)
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn resume(
        &self,
        id: Uuid,
        next_billing_at: DateTime<Utc>,
    ) -> DbResult<Option<SubscriptionRow>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"
            UPDATE subscriptions
            SET status = 'active', next_billing_at = $1, updated_at = NOW()
            WHERE id = $2 AND status = 'paused'
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(next_billing_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn cancel(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"
            UPDATE subscriptions
            SET status = 'cancelled', updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'active', 'paused')
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_address(
        &self,
        id: Uuid,
        address: &Address,
    ) -> DbResult<Option<SubscriptionRow>> {
        let row = sqlx::query_as::<_, SubscriptionRow>(&format!(
            r#"
            UPDATE subscriptions
            SET street = $1, city = $2, postal_code = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.postal_code)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
