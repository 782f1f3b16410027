//! Deterministic core of a ride-hailing client: trip planning, fare and loyalty
//! math, the ride lifecycle, and a timer-driven driver tracking simulation on a
//! virtual clock.
//!
//! [`session::RideSession`] is the entry point. It owns a `bevy_ecs` world in
//! which every store is a resource, and a schedule of systems that react to
//! timers popped from [`clock::SimulationClock`].

pub mod clock;
pub mod config;
pub mod error;
pub mod geo;
pub mod pricing;
pub mod random;
pub mod ride;
pub mod runner;
pub mod scenario;
pub mod session;
pub mod storage;
pub mod store;
pub mod systems;
pub mod telemetry;
pub mod tracking;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
