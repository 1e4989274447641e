//! Notification event types
//!
//! Notifications are a fire-and-forget side channel: state changes emit
//! one of these events toward the owning user, and a failed emit never
//! fails the operation that produced it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of notification event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Payment confirmed, subscription is live
    SubscriptionActivated,
    /// Customer skipped an upcoming delivery
    DeliverySkipped,
    /// Customer changed a delivery's address
    DeliveryAddressChanged,
    /// Chef handed over the meal
    DeliveryCompleted,
}

impl NotificationKind {
    /// Stable string form for transport/storage
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SubscriptionActivated => "subscription_activated",
            Self::DeliverySkipped => "delivery_skipped",
            Self::DeliveryAddressChanged => "delivery_address_changed",
            Self::DeliveryCompleted => "delivery_completed",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification event addressed to a single user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Recipient (customer or chef user ID)
    pub recipient: Uuid,
    /// Event kind
    pub kind: NotificationKind,
    /// Short title
    pub title: String,
    /// Human-readable message
    pub message: String,
    /// Optional structured payload
    pub metadata: Option<serde_json::Value>,
}
