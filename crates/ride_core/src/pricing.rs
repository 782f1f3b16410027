//! Fare estimation, loyalty discount and fare splitting.
//!
//! Formula: `fare = round2(base_fare + distance_km * rate_per_km[ride_type])`
//! where `distance_km` is the planar proxy from [`crate::geo::planar_distance_km`].
//! Riders holding at least `loyalty_threshold_points` get a flat
//! `loyalty_discount_percent` off every fare they book.

use serde::{Deserialize, Serialize};

use crate::geo::{planar_distance_km, Location, KM_PER_DEGREE};

/// Base fare in currency units.
pub const BASE_FARE: f64 = 5.0;

pub const LOYALTY_DISCOUNT_THRESHOLD: u32 = 100;
pub const LOYALTY_DISCOUNT_PERCENT: f64 = 10.0;

pub const MIN_SPLIT_COUNT: u8 = 2;
pub const MAX_SPLIT_COUNT: u8 = 4;

/// Tip presets offered on the completion screen.
pub const TIP_OPTIONS: [f64; 4] = [0.0, 20.0, 50.0, 100.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideType {
    #[default]
    Economy,
    Auto,
    Premium,
    Suv,
    Bike,
}

impl RideType {
    pub const ALL: [RideType; 5] = [
        RideType::Economy,
        RideType::Auto,
        RideType::Premium,
        RideType::Suv,
        RideType::Bike,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RideType::Economy => "economy",
            RideType::Auto => "auto",
            RideType::Premium => "premium",
            RideType::Suv => "suv",
            RideType::Bike => "bike",
        }
    }
}

impl std::fmt::Display for RideType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-kilometre rate for each ride type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RideRates {
    pub economy: f64,
    pub auto: f64,
    pub premium: f64,
    pub suv: f64,
    pub bike: f64,
}

impl Default for RideRates {
    fn default() -> Self {
        Self {
            economy: 1.5,
            auto: 1.05,
            premium: 2.5,
            suv: 3.0,
            bike: 0.8,
        }
    }
}

impl RideRates {
    pub fn rate(&self, ride_type: RideType) -> f64 {
        match ride_type {
            RideType::Economy => self.economy,
            RideType::Auto => self.auto,
            RideType::Premium => self.premium,
            RideType::Suv => self.suv,
            RideType::Bike => self.bike,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub base_fare: f64,
    pub km_per_degree: f64,
    pub rates: RideRates,
    pub loyalty_threshold_points: u32,
    pub loyalty_discount_percent: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            base_fare: BASE_FARE,
            km_per_degree: KM_PER_DEGREE,
            rates: RideRates::default(),
            loyalty_threshold_points: LOYALTY_DISCOUNT_THRESHOLD,
            loyalty_discount_percent: LOYALTY_DISCOUNT_PERCENT,
        }
    }
}

impl PricingConfig {
    /// Estimated fare between two picked locations; 0 when either is missing.
    pub fn estimate_fare(
        &self,
        pickup: Option<&Location>,
        destination: Option<&Location>,
        ride_type: RideType,
    ) -> f64 {
        let (Some(pickup), Some(destination)) = (pickup, destination) else {
            return 0.0;
        };
        let distance_km =
            planar_distance_km(pickup.point(), destination.point(), self.km_per_degree);
        round2(self.base_fare + distance_km * self.rates.rate(ride_type))
    }

    pub fn loyalty_discount_percent(&self, loyalty_points: u32) -> f64 {
        if loyalty_points >= self.loyalty_threshold_points {
            self.loyalty_discount_percent
        } else {
            0.0
        }
    }

    pub fn apply_loyalty_discount(&self, fare: f64, loyalty_points: u32) -> f64 {
        let percent = self.loyalty_discount_percent(loyalty_points);
        if percent <= 0.0 {
            return fare;
        }
        round2(fare * (1.0 - percent / 100.0))
    }
}

/// Rounds a currency amount to two decimals (half away from zero).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Clamps a requested co-rider count into the supported split range.
pub fn clamp_split_count(count: i64) -> u8 {
    count.clamp(MIN_SPLIT_COUNT as i64, MAX_SPLIT_COUNT as i64) as u8
}

/// The rider's share of a fare; the whole fare unless the ride is shared.
pub fn per_person_fare(fare: f64, split_count: Option<u8>) -> f64 {
    match split_count {
        Some(count) => round2(fare / f64::from(count.max(1))),
        None => fare,
    }
}

/// Totals shown after a ride is completed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub fare: f64,
    pub split_count: Option<u8>,
    pub per_person_fare: f64,
    pub tip: f64,
    pub total: f64,
    pub points_earned: u32,
    pub loyalty_points: u32,
}

impl Receipt {
    pub fn new(
        fare: f64,
        split_count: Option<u8>,
        tip: f64,
        points_earned: u32,
        loyalty_points: u32,
    ) -> Self {
        let share = per_person_fare(fare, split_count);
        Self {
            fare,
            split_count,
            per_person_fare: share,
            tip,
            total: round2(share + tip),
            points_earned,
            loyalty_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(lat: f64, lng: f64) -> Location {
        Location {
            lat,
            lng,
            address: String::new(),
        }
    }

    #[test]
    fn fare_follows_planar_formula() {
        let pricing = PricingConfig::default();
        let pickup = loc(28.6139, 77.2090);
        let destination = loc(28.5535, 77.2588);
        let fare = pricing.estimate_fare(Some(&pickup), Some(&destination), RideType::Economy);

        let distance = ((0.0604_f64).powi(2) + (0.0498_f64).powi(2)).sqrt() * 111.0;
        assert!((distance - 8.69).abs() < 0.01);
        assert_eq!(fare, 18.03);
        assert!((fare - 18.05).abs() < 0.05);
    }

    #[test]
    fn fare_is_zero_without_both_locations() {
        let pricing = PricingConfig::default();
        let pickup = loc(28.6139, 77.2090);
        assert_eq!(pricing.estimate_fare(Some(&pickup), None, RideType::Suv), 0.0);
        assert_eq!(pricing.estimate_fare(None, Some(&pickup), RideType::Suv), 0.0);
        assert_eq!(pricing.estimate_fare(None, None, RideType::Bike), 0.0);
    }

    #[test]
    fn same_point_costs_base_fare_for_every_type() {
        let pricing = PricingConfig::default();
        let p = loc(12.0, 77.0);
        for ride_type in RideType::ALL {
            assert_eq!(pricing.estimate_fare(Some(&p), Some(&p), ride_type), BASE_FARE);
        }
    }

    #[test]
    fn pricier_types_cost_more() {
        let pricing = PricingConfig::default();
        let a = loc(28.6139, 77.2090);
        let b = loc(28.5535, 77.2588);
        let fare = |t| pricing.estimate_fare(Some(&a), Some(&b), t);
        assert!(fare(RideType::Bike) < fare(RideType::Auto));
        assert!(fare(RideType::Auto) < fare(RideType::Economy));
        assert!(fare(RideType::Economy) < fare(RideType::Premium));
        assert!(fare(RideType::Premium) < fare(RideType::Suv));
    }

    #[test]
    fn loyalty_discount_applies_at_threshold() {
        let pricing = PricingConfig::default();
        assert_eq!(pricing.apply_loyalty_discount(18.03, 99), 18.03);
        assert_eq!(pricing.apply_loyalty_discount(18.03, 100), 16.23);
        assert_eq!(pricing.apply_loyalty_discount(20.0, 250), 18.0);
        assert_eq!(pricing.loyalty_discount_percent(40), 0.0);
        assert_eq!(pricing.loyalty_discount_percent(105), 10.0);
    }

    #[test]
    fn split_count_is_clamped() {
        assert_eq!(clamp_split_count(-7), 2);
        assert_eq!(clamp_split_count(0), 2);
        assert_eq!(clamp_split_count(3), 3);
        assert_eq!(clamp_split_count(99), 4);
    }

    #[test]
    fn receipt_splits_fare_then_adds_tip() {
        let receipt = Receipt::new(30.0, Some(3), 20.0, 20, 60);
        assert_eq!(receipt.per_person_fare, 10.0);
        assert_eq!(receipt.total, 30.0);

        let solo = Receipt::new(18.03, None, 0.0, 20, 60);
        assert_eq!(solo.per_person_fare, 18.03);
        assert_eq!(solo.total, 18.03);
    }

    #[test]
    fn ride_type_serializes_lowercase() {
        let json = serde_json::to_string(&RideType::Suv).expect("serialize");
        assert_eq!(json, "\"suv\"");
        assert_eq!(RideType::Premium.to_string(), "premium");
    }
}
