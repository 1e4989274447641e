//! Delivery types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subscription::StatusParseError;
use crate::{Address, ChefId, SubscriptionId, UserId};

/// Unique delivery identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryId(pub Uuid);

impl DeliveryId {
    /// Create a new random delivery ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a delivery ID from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for DeliveryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for DeliveryId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Delivery status
///
/// `Scheduled -> Skipped` and `Scheduled -> Delivered` are the only
/// legal transitions; both targets are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Created at schedule generation, awaiting fulfilment
    Scheduled,
    /// Customer opted out of this occurrence
    Skipped,
    /// Chef marked the meal as handed over
    Delivered,
}

impl DeliveryStatus {
    /// Stable string form used in the database
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Skipped => "skipped",
            Self::Delivered => "delivered",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "skipped" => Ok(Self::Skipped),
            "delivered" => Ok(Self::Delivered),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

/// Meal slot for a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    /// Midday delivery
    Lunch,
    /// Evening delivery
    Dinner,
}

impl MealType {
    /// Stable string form used in the database
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        }
    }
}

impl Default for MealType {
    fn default() -> Self {
        Self::Lunch
    }
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MealType {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            _ => Err(StatusParseError(s.to_string())),
        }
    }
}

/// A single scheduled meal occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    /// Delivery ID
    pub id: DeliveryId,
    /// Parent subscription
    pub subscription_id: SubscriptionId,
    /// Customer receiving the meal
    pub user_id: UserId,
    /// Chef fulfilling the meal, if one is assigned
    pub chef_id: Option<ChefId>,
    /// Calendar day this delivery is due
    pub delivery_date: NaiveDate,
    /// Address snapshot, independently mutable from the subscription
    pub address: Address,
    /// Meal slot
    pub meal_type: MealType,
    /// Current status
    pub status: DeliveryStatus,
    /// When the chef marked the delivery complete
    pub delivered_at: Option<DateTime<Utc>>,
    /// When the delivery entry was created
    pub created_at: DateTime<Utc>,
    /// When the delivery entry was last updated
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_status_roundtrip() {
        for status in [
            DeliveryStatus::Scheduled,
            DeliveryStatus::Skipped,
            DeliveryStatus::Delivered,
        ] {
            let parsed: DeliveryStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_meal_type_default_is_lunch() {
        assert_eq!(MealType::default(), MealType::Lunch);
    }
}
