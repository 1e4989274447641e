//! Core configuration

use chrono::FixedOffset;
use tiffin_types::MealType;

use crate::cutoff::CutoffPolicy;

/// Subscription core configuration
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Fixed UTC offset of the marketplace's local time
    ///
    /// All cutoff boundaries (the 20:00 day-before cutoff, the weekly
    /// Friday-to-Monday lock, midnight billing anchors) are evaluated
    /// in this offset.
    pub local_offset: FixedOffset,
    /// Hour of day (local) after which the day-before cutoff engages
    pub cutoff_hour: u32,
    /// How many days of deliveries one activation schedules
    pub delivery_horizon_days: u32,
    /// Billing period length in days
    pub billing_period_days: i64,
    /// Meal slot assigned to generated deliveries
    pub default_meal_type: MealType,
}

impl CoreConfig {
    /// Create a config with the marketplace defaults
    pub fn new() -> Self {
        Self {
            local_offset: FixedOffset::east_opt(0).expect("zero offset is valid"),
            cutoff_hour: 20,
            delivery_horizon_days: 7,
            billing_period_days: 7,
            default_meal_type: MealType::Lunch,
        }
    }

    /// Set the local UTC offset in minutes east of UTC
    pub fn with_offset_minutes(mut self, minutes: i32) -> Self {
        if let Some(offset) = FixedOffset::east_opt(minutes * 60) {
            self.local_offset = offset;
        }
        self
    }

    /// Set the daily cutoff hour (0-23, local time)
    pub fn with_cutoff_hour(mut self, hour: u32) -> Self {
        if hour < 24 {
            self.cutoff_hour = hour;
        }
        self
    }

    /// Set the default meal slot for generated deliveries
    pub fn with_meal_type(mut self, meal_type: MealType) -> Self {
        self.default_meal_type = meal_type;
        self
    }

    /// Build the cutoff policy for this configuration
    pub fn cutoff_policy(&self) -> CutoffPolicy {
        CutoffPolicy::new(self.local_offset, self.cutoff_hour)
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::new();
        assert_eq!(config.cutoff_hour, 20);
        assert_eq!(config.delivery_horizon_days, 7);
        assert_eq!(config.billing_period_days, 7);
    }

    #[test]
    fn test_invalid_cutoff_hour_ignored() {
        let config = CoreConfig::new().with_cutoff_hour(24);
        assert_eq!(config.cutoff_hour, 20);
    }

    #[test]
    fn test_offset_minutes() {
        // IST is UTC+5:30
        let config = CoreConfig::new().with_offset_minutes(330);
        assert_eq!(config.local_offset.local_minus_utc(), 330 * 60);
    }
}
