//! Shared response types for REST handlers

use serde::{Deserialize, Serialize};

use tiffin_types::{Address, Delivery, Subscription};

/// Address payload used in requests and responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressPayload {
    pub street: String,
    pub city: String,
    pub postal_code: String,
}

impl From<AddressPayload> for Address {
    fn from(payload: AddressPayload) -> Self {
        Address {
            street: payload.street,
            city: payload.city,
            postal_code: payload.postal_code,
        }
    }
}

impl From<Address> for AddressPayload {
    fn from(address: Address) -> Self {
        Self {
            street: address.street,
            city: address.city,
            postal_code: address.postal_code,
        }
    }
}

/// Subscription shape returned by every lifecycle endpoint
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub user_id: String,
    pub chef_id: Option<String>,
    pub plan_id: Option<String>,
    pub plan_name: String,
    pub meals_per_week: i32,
    pub price_cents: i64,
    pub status: String,
    pub address: AddressPayload,
    pub start_date: Option<String>,
    pub next_billing_at: String,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            id: sub.id.to_string(),
            user_id: sub.user_id.to_string(),
            chef_id: sub.chef_id.map(|c| c.to_string()),
            plan_id: sub.plan_id.map(|p| p.to_string()),
            plan_name: sub.plan_name,
            meals_per_week: sub.meals_per_week,
            price_cents: sub.price_cents,
            status: sub.status.to_string(),
            address: sub.address.into(),
            start_date: sub.start_date.map(|t| t.to_rfc3339()),
            next_billing_at: sub.next_billing_at.to_rfc3339(),
        }
    }
}

/// Delivery shape returned by every delivery endpoint
#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub id: String,
    pub subscription_id: String,
    pub delivery_date: String,
    pub meal_type: String,
    pub status: String,
    pub address: AddressPayload,
    pub delivered_at: Option<String>,
}

impl From<Delivery> for DeliveryResponse {
    fn from(delivery: Delivery) -> Self {
        Self {
            id: delivery.id.to_string(),
            subscription_id: delivery.subscription_id.to_string(),
            delivery_date: delivery.delivery_date.to_string(),
            meal_type: delivery.meal_type.to_string(),
            status: delivery.status.to_string(),
            address: delivery.address.into(),
            delivered_at: delivery.delivered_at.map(|t| t.to_rfc3339()),
        }
    }
}
