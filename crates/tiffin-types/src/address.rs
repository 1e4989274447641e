//! Delivery address snapshots

use serde::{Deserialize, Serialize};

/// A delivery address snapshot
///
/// Addresses are copied by value at well-defined points (subscription
/// creation, delivery schedule generation) and mutate independently
/// afterwards. There is no address entity shared by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street line
    pub street: String,
    /// City
    pub city: String,
    /// Postal code
    pub postal_code: String,
}

impl Address {
    /// Create a new address snapshot
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            postal_code: postal_code.into(),
        }
    }

    /// Check that every field carries a non-blank value
    pub fn is_complete(&self) -> bool {
        !self.street.trim().is_empty()
            && !self.city.trim().is_empty()
            && !self.postal_code.trim().is_empty()
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {} {}", self.street, self.postal_code, self.city)
    }
}
