//! Driver approach simulation.
//!
//! While the status is `arriving`, two repeating timers run side by side:
//!
//! - **position** (`TrackingTick`): moves the driver a fixed fraction of the
//!   remaining lat/lng delta toward pickup plus GPS-like jitter, then derives
//!   distance (haversine), speed and ETA from the new position.
//! - **arrival check** (`ArrivalCheck`): once distance drops below the threshold
//!   the status becomes `arrived`, the readings are zeroed and both timers are
//!   cancelled.
//!
//! `arrived` hops to `in-progress` after a fixed delay. The in-transit leg is not
//! animated. Stopping the simulator cancels every timer it owns, so no tick can
//! touch the state afterwards.

use bevy_ecs::prelude::Resource;
use tracing::{debug, info};

use crate::clock::{EventKind, SimulationClock, TimerHandle};
use crate::config::TrackingConfig;
use crate::geo::{haversine_km, GeoPoint};
use crate::random::SimRng;
use crate::ride::TrackingStatus;

/// Minutes to cover `distance_km` at `assumed_speed_kmh`, never below one.
pub fn eta_minutes(distance_km: f64, assumed_speed_kmh: f64) -> u32 {
    let minutes = (distance_km / assumed_speed_kmh.max(f64::EPSILON) * 60.0).ceil();
    if minutes.is_finite() && minutes > 1.0 {
        minutes as u32
    } else {
        1
    }
}

/// Speed implied by the distance closed during one tick, treating the tick as
/// 1/60 of an hour. Moving away (jitter near pickup) reads as zero.
pub fn instant_speed_kmh(previous_distance_km: f64, distance_km: f64) -> f64 {
    ((previous_distance_km - distance_km) * 60.0).max(0.0)
}

/// Readings after one position update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionUpdate {
    pub driver_location: GeoPoint,
    pub distance_km: f64,
    pub speed_kmh: f64,
    pub eta_min: u32,
}

#[derive(Debug, Default, Resource)]
pub struct TrackingState {
    status: TrackingStatus,
    pickup: Option<GeoPoint>,
    driver_location: Option<GeoPoint>,
    distance_km: f64,
    speed_kmh: f64,
    eta_min: u32,
    position_timer: Option<TimerHandle>,
    arrival_timer: Option<TimerHandle>,
    start_timer: Option<TimerHandle>,
}

impl TrackingState {
    pub fn status(&self) -> TrackingStatus {
        self.status
    }

    pub fn pickup(&self) -> Option<GeoPoint> {
        self.pickup
    }

    pub fn driver_location(&self) -> Option<GeoPoint> {
        self.driver_location
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    pub fn eta_min(&self) -> u32 {
        self.eta_min
    }

    pub fn position_timer(&self) -> Option<TimerHandle> {
        self.position_timer
    }

    pub fn arrival_timer(&self) -> Option<TimerHandle> {
        self.arrival_timer
    }

    pub fn start_timer(&self) -> Option<TimerHandle> {
        self.start_timer
    }

    /// True while any simulator timer is armed.
    pub fn is_running(&self) -> bool {
        self.position_timer.is_some() || self.arrival_timer.is_some() || self.start_timer.is_some()
    }

    /// Enters `arriving` with the driver placed at the configured offset from pickup.
    ///
    /// Without a pickup the driver marker is placed near the fallback origin and no
    /// timers are armed. Returns whether the simulation loop started.
    pub fn start(
        &mut self,
        clock: &mut SimulationClock,
        config: &TrackingConfig,
        pickup: Option<GeoPoint>,
    ) -> bool {
        let offset = config.initial_offset_deg;
        match pickup {
            Some(pickup) => {
                self.start_from(clock, config, pickup, pickup.offset(offset, offset));
                true
            }
            None => {
                self.stop(clock);
                self.reset(TrackingStatus::Arriving);
                self.driver_location = Some(config.fallback_origin.offset(offset, offset));
                info!("tracking shown without pickup; driver simulation idle");
                false
            }
        }
    }

    /// Enters `arriving` with an explicit driver position and arms both timers.
    pub fn start_from(
        &mut self,
        clock: &mut SimulationClock,
        config: &TrackingConfig,
        pickup: GeoPoint,
        driver_location: GeoPoint,
    ) {
        self.stop(clock);
        self.reset(TrackingStatus::Arriving);
        let distance_km = haversine_km(driver_location, pickup);
        self.pickup = Some(pickup);
        self.driver_location = Some(driver_location);
        self.distance_km = distance_km;
        self.eta_min = eta_minutes(distance_km, config.assumed_speed_kmh);
        self.position_timer = Some(clock.schedule_every(config.tick_ms, EventKind::TrackingTick));
        self.arrival_timer = Some(clock.schedule_every(config.tick_ms, EventKind::ArrivalCheck));
        info!(
            distance_km,
            eta_min = self.eta_min,
            "driver arriving"
        );
    }

    /// One position-timer tick. No-op unless the driver is still arriving.
    pub fn advance(&mut self, rng: &mut SimRng, config: &TrackingConfig) -> Option<PositionUpdate> {
        if self.status != TrackingStatus::Arriving {
            return None;
        }
        let (pickup, current) = (self.pickup?, self.driver_location?);

        let next = current
            .step_toward(pickup, config.step_fraction)
            .offset(rng.jitter(config.jitter_deg), rng.jitter(config.jitter_deg));
        let distance_km = haversine_km(next, pickup);
        let speed_kmh = instant_speed_kmh(self.distance_km, distance_km);
        let eta_min = eta_minutes(distance_km, config.assumed_speed_kmh);

        self.driver_location = Some(next);
        self.distance_km = distance_km;
        self.speed_kmh = speed_kmh;
        self.eta_min = eta_min;

        debug!(distance_km, speed_kmh, eta_min, "driver position updated");
        Some(PositionUpdate {
            driver_location: next,
            distance_km,
            speed_kmh,
            eta_min,
        })
    }

    /// One arrival-check tick. On arrival, zeroes the readings, cancels both
    /// intervals and schedules the hop to `in-progress`.
    pub fn check_arrival(&mut self, clock: &mut SimulationClock, config: &TrackingConfig) -> bool {
        if self.status != TrackingStatus::Arriving || self.pickup.is_none() {
            return false;
        }
        if self.distance_km >= config.arrival_threshold_km {
            return false;
        }

        self.status = TrackingStatus::Arrived;
        self.distance_km = 0.0;
        self.speed_kmh = 0.0;
        self.eta_min = 0;
        self.cancel_intervals(clock);
        self.start_timer = Some(clock.schedule_in(config.start_delay_ms, EventKind::RideStarted));
        info!("driver arrived at pickup");
        true
    }

    /// Hop from `arrived` to `in-progress`.
    pub fn begin_ride(&mut self) -> bool {
        if self.status != TrackingStatus::Arrived {
            return false;
        }
        self.start_timer = None;
        self.status = TrackingStatus::InProgress;
        info!("ride in progress");
        true
    }

    pub fn complete(&mut self, clock: &mut SimulationClock) {
        self.stop(clock);
        self.status = TrackingStatus::Completed;
    }

    /// Cancels every timer the simulator owns. Readings are left as they were.
    pub fn stop(&mut self, clock: &mut SimulationClock) -> usize {
        let mut cancelled = self.cancel_intervals(clock);
        if let Some(handle) = self.start_timer.take() {
            cancelled += usize::from(clock.cancel(handle));
        }
        if cancelled > 0 {
            debug!(cancelled, "tracking timers cleared");
        }
        cancelled
    }

    fn cancel_intervals(&mut self, clock: &mut SimulationClock) -> usize {
        [self.position_timer.take(), self.arrival_timer.take()]
            .into_iter()
            .flatten()
            .filter(|handle| clock.cancel(*handle))
            .count()
    }

    fn reset(&mut self, status: TrackingStatus) {
        *self = Self {
            status,
            ..Self::default()
        };
    }
}
