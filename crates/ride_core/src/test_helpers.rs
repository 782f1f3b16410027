//! Shared fixtures for tests, benches and the demo example.

use crate::config::RideConfig;
use crate::geo::{GeoPoint, Location};
use crate::session::RideSession;

pub const CONNAUGHT_PLACE: GeoPoint = GeoPoint {
    lat: 28.6139,
    lng: 77.2090,
};

pub const NEHRU_PLACE: GeoPoint = GeoPoint {
    lat: 28.5535,
    lng: 77.2588,
};

/// Economy fare between the two demo locations.
pub const DEMO_ECONOMY_FARE: f64 = 18.03;

pub fn demo_pickup() -> Location {
    Location::at(CONNAUGHT_PLACE, "Connaught Place, New Delhi")
}

pub fn demo_destination() -> Location {
    Location::at(NEHRU_PLACE, "Nehru Place, New Delhi")
}

/// Session with both demo locations already picked.
pub fn planned_session(config: RideConfig) -> RideSession {
    let mut session = RideSession::new(config);
    session.set_pickup(demo_pickup());
    session.set_destination(demo_destination());
    session
}

/// Deterministic config: fixed seed, fixed search delay and no GPS jitter.
pub fn deterministic_config() -> RideConfig {
    RideConfig::default()
        .with_seed(42)
        .with_search_delay_ms(4000)
        .with_jitter_deg(0.0)
}
