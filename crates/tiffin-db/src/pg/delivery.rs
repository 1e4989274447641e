//! PostgreSQL delivery repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tiffin_types::{Address, DeliveryStatus};

use crate::error::DbResult;
use crate::models::DeliveryRow;
use crate::repo::{CreateDelivery, DeliveryRepository};

const DELIVERY_COLUMNS: &str = r#"id, subscription_id, user_id, chef_id, delivery_date,
       street, city, postal_code, meal_type, status, delivered_at,
       created_at, updated_at"#;

/// PostgreSQL delivery repository
#[derive(Clone)]
pub struct PgDeliveryRepository {
    pool: PgPool,
}

impl PgDeliveryRepository {
    /// Create a new delivery repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryRepository for PgDeliveryRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<DeliveryRow>> {
        let delivery = sqlx::query_as::<_, DeliveryRow>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(delivery)
    }

    async fn list_by_subscription(&self, subscription_id: Uuid) -> DbResult<Vec<DeliveryRow>> {
        let deliveries = sqlx::query_as::<_, DeliveryRow>(&format!(
            r#"
            SELECT {DELIVERY_COLUMNS}
            FROM deliveries
            WHERE subscription_id = $1
            ORDER BY delivery_date ASC
            "#
        ))
        .bind(subscription_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(deliveries)
    }

    async fn create_batch(&self, deliveries: Vec<CreateDelivery>) -> DbResult<Vec<DeliveryRow>> {
        // One statement per entry inside a single transaction; the batch
        // is only ever 7 rows, written once at activation.
        let mut tx = self.pool.begin().await?;
        let mut rows = Vec::with_capacity(deliveries.len());

        for d in deliveries {
            let row = sqlx::query_as::<_, DeliveryRow>(&format!(
                r#"
                INSERT INTO deliveries (id, subscription_id, user_id, chef_id, delivery_date,
                                        street, city, postal_code, meal_type, status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'scheduled')
                RETURNING {DELIVERY_COLUMNS}
                "#
            ))
            .bind(d.id)
            .bind(d.subscription_id)
            .bind(d.user_id)
            .bind(d.chef_id)
            .bind(d.delivery_date)
            .bind(&d.address.street)
            .bind(&d.address.city)
            .bind(&d.address.postal_code)
            .bind(d.meal_type.as_str())
            .fetch_one(&mut *tx)
            .await?;

            rows.push(row);
        }

        tx.commit().await?;
        Ok(rows)
    }

    async fn set_status(
        &self,
        id: Uuid,
        expected: DeliveryStatus,
        new: DeliveryStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> DbResult<Option<DeliveryRow>> {
        let row = sqlx::query_as::<_, DeliveryRow>(&format!(
            r#"
            UPDATE deliveries
            SET status = $1, delivered_at = COALESCE($2, delivered_at), updated_at = NOW()
            WHERE id = $3 AND status = $4
            RETURNING {DELIVERY_COLUMNS}
            "#
        ))
        .bind(new.as_str())
        .bind(delivered_at)
        .bind(id)
        .bind(expected.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_address_if_scheduled(
        &self,
        id: Uuid,
        address: &Address,
    ) -> DbResult<Option<DeliveryRow>> {
        let row = sqlx::query_as::<_, DeliveryRow>(&format!(
            r#"
            UPDATE deliveries
            SET street = $1, city = $2, postal_code = $3, updated_at = NOW()
            WHERE id = $4 AND status = 'scheduled'
            RETURNING {DELIVERY_COLUMNS}
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
