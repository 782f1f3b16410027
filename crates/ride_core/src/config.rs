//! Session configuration.
//!
//! Each group is also a [`Resource`] so systems read exactly the part they need.
//! All groups deserialize with defaults for missing fields, so a config file only
//! has to name what it overrides.

use std::path::Path;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::clock::{DEFAULT_EPOCH_MS, ONE_SEC_MS};
use crate::error::ConfigError;
use crate::geo::GeoPoint;
use crate::pricing::PricingConfig;

/// Loyalty programme parameters. The discount itself lives in [`PricingConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoyaltyConfig {
    pub initial_points: u32,
    pub points_per_ride: u32,
}

impl Default for LoyaltyConfig {
    fn default() -> Self {
        Self {
            initial_points: 40,
            points_per_ride: 20,
        }
    }
}

/// Driver approach simulation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct TrackingConfig {
    /// Period of both the position timer and the arrival-check timer.
    pub tick_ms: u64,
    /// Share of the remaining lat/lng delta covered per tick.
    pub step_fraction: f64,
    /// Maximum absolute GPS noise added per axis, in degrees.
    pub jitter_deg: f64,
    pub arrival_threshold_km: f64,
    pub assumed_speed_kmh: f64,
    /// Delay between `arrived` and `in-progress`.
    pub start_delay_ms: u64,
    /// Where the driver appears relative to pickup, in degrees on both axes.
    pub initial_offset_deg: f64,
    /// Reference point used for the driver marker when no pickup is known.
    pub fallback_origin: GeoPoint,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tick_ms: ONE_SEC_MS,
            step_fraction: 0.15,
            jitter_deg: 0.000_05,
            arrival_threshold_km: 0.05,
            assumed_speed_kmh: 30.0,
            start_delay_ms: 3 * ONE_SEC_MS,
            initial_offset_deg: 0.01,
            fallback_origin: GeoPoint {
                lat: 37.7749,
                lng: -122.4194,
            },
        }
    }
}

/// Delays of the simulated backend round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct BookingConfig {
    pub booking_delay_ms: u64,
    pub search_min_ms: u64,
    pub search_max_ms: u64,
    pub arriving_notice_delay_ms: u64,
    pub history_load_delay_ms: u64,
    pub auth_delay_ms: u64,
    /// Fare shown on the completion screen when neither a ride nor an estimate exists.
    pub fallback_fare: f64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            booking_delay_ms: 1500,
            search_min_ms: 3000,
            search_max_ms: 5000,
            arriving_notice_delay_ms: 2000,
            history_load_delay_ms: 500,
            auth_delay_ms: 1000,
            fallback_fare: 15.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RideConfig {
    pub seed: u64,
    pub epoch_ms: i64,
    pub pricing: PricingConfig,
    pub loyalty: LoyaltyConfig,
    pub tracking: TrackingConfig,
    pub booking: BookingConfig,
}

impl Default for RideConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            epoch_ms: DEFAULT_EPOCH_MS,
            pricing: PricingConfig::default(),
            loyalty: LoyaltyConfig::default(),
            tracking: TrackingConfig::default(),
            booking: BookingConfig::default(),
        }
    }
}

impl RideConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.booking.search_min_ms > self.booking.search_max_ms {
            return Err(ConfigError::Invalid(format!(
                "search_min_ms ({}) exceeds search_max_ms ({})",
                self.booking.search_min_ms, self.booking.search_max_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.tracking.step_fraction) {
            return Err(ConfigError::Invalid(format!(
                "step_fraction must be within [0, 1], got {}",
                self.tracking.step_fraction
            )));
        }
        if self.tracking.assumed_speed_kmh <= 0.0 {
            return Err(ConfigError::Invalid(
                "assumed_speed_kmh must be positive".to_string(),
            ));
        }
        if self.tracking.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be positive".to_string()));
        }
        if !(0.0..=100.0).contains(&self.pricing.loyalty_discount_percent) {
            return Err(ConfigError::Invalid(format!(
                "loyalty_discount_percent must be within [0, 100], got {}",
                self.pricing.loyalty_discount_percent
            )));
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_loyalty_points(mut self, initial_points: u32, points_per_ride: u32) -> Self {
        self.loyalty = LoyaltyConfig {
            initial_points,
            points_per_ride,
        };
        self
    }

    /// Fixes the search delay to a single value.
    pub fn with_search_delay_ms(mut self, delay_ms: u64) -> Self {
        self.booking.search_min_ms = delay_ms;
        self.booking.search_max_ms = delay_ms;
        self
    }

    pub fn with_jitter_deg(mut self, jitter_deg: f64) -> Self {
        self.tracking.jitter_deg = jitter_deg;
        self
    }

    pub fn with_initial_offset_deg(mut self, offset_deg: f64) -> Self {
        self.tracking.initial_offset_deg = offset_deg;
        self
    }
}
