//! Subscription types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Address, ChefId, UserId};

/// Unique subscription identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    /// Create a new random subscription ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a subscription ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SubscriptionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Unique meal plan identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(pub Uuid);

impl PlanId {
    /// Create a new random plan ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a plan ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PlanId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Subscription status
///
/// Legal transitions:
/// - `Pending -> Active` (confirmed payment)
/// - `Active -> Paused` and `Paused -> Active`
/// - `{Pending, Active, Paused} -> Cancelled`
///
/// `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Created, awaiting payment confirmation
    Pending,
    /// Payment confirmed, deliveries scheduled
    Active,
    /// Temporarily suspended by the customer
    Paused,
    /// Terminated; no further transitions
    Cancelled,
}

impl SubscriptionStatus {
    /// Stable string form used in the database
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses that count toward the one-subscription-per-user rule
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Active)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

/// Error parsing a status string
#[derive(Debug, Clone)]
pub struct StatusParseError(pub String);

impl std::fmt::Display for StatusParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid status: {}", self.0)
    }
}

impl std::error::Error for StatusParseError {}

/// A customer's meal-plan subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription ID
    pub id: SubscriptionId,
    /// Customer who owns the subscription
    pub user_id: UserId,
    /// Chef cooking for this subscription, if assigned
    pub chef_id: Option<ChefId>,
    /// Plan the subscription was created from, if any
    pub plan_id: Option<PlanId>,
    /// Plan name at creation time
    pub plan_name: String,
    /// Meals delivered per week
    pub meals_per_week: i32,
    /// Current price in minor currency units
    pub price_cents: i64,
    /// Price captured at creation; never updated afterwards
    pub price_snapshot_cents: i64,
    /// Delivery address snapshot
    pub address: Address,
    /// Current status
    pub status: SubscriptionStatus,
    /// When the subscription became active
    pub start_date: Option<DateTime<Utc>>,
    /// Next billing instant
    pub next_billing_at: DateTime<Utc>,
    /// External payment order reference
    pub payment_order_ref: Option<String>,
    /// External payment confirmation reference
    pub payment_ref: Option<String>,
    /// When the subscription was created
    pub created_at: DateTime<Utc>,
    /// When the subscription was last updated
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether the subscription still counts toward the per-user limit
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}
