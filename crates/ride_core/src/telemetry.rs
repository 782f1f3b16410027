//! Telemetry: tracking samples, status transitions and ride counters.

use bevy_ecs::prelude::Resource;
use h3o::CellIndex;

use crate::geo::GeoPoint;
use crate::ride::{RideStatus, TrackingStatus};

/// One position update of the simulated driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingSample {
    pub timestamp_ms: u64,
    pub driver_location: GeoPoint,
    pub cell: Option<CellIndex>,
    pub distance_km: f64,
    pub speed_kmh: f64,
    pub eta_min: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Ride(RideStatus),
    Tracking(TrackingStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub timestamp_ms: u64,
    pub ride_id: Option<String>,
    pub change: StatusChange,
}

/// Collects session telemetry. Insert as a resource to record tracking and lifecycle data.
#[derive(Debug, Default, Resource)]
pub struct RideTelemetry {
    pub samples: Vec<TrackingSample>,
    pub transitions: Vec<StatusTransition>,
    pub rides_booked: u64,
    pub rides_cancelled: u64,
    pub rides_completed: u64,
}

impl RideTelemetry {
    pub fn record_sample(&mut self, sample: TrackingSample) {
        self.samples.push(sample);
    }

    pub fn record_transition(
        &mut self,
        timestamp_ms: u64,
        ride_id: Option<&str>,
        change: StatusChange,
    ) {
        self.transitions.push(StatusTransition {
            timestamp_ms,
            ride_id: ride_id.map(str::to_string),
            change,
        });
        match change {
            StatusChange::Ride(RideStatus::Confirmed) => {
                self.rides_booked = self.rides_booked.saturating_add(1)
            }
            StatusChange::Ride(RideStatus::Cancelled) => {
                self.rides_cancelled = self.rides_cancelled.saturating_add(1)
            }
            StatusChange::Ride(RideStatus::Completed) => {
                self.rides_completed = self.rides_completed.saturating_add(1)
            }
            _ => {}
        }
    }

    pub fn last_sample(&self) -> Option<&TrackingSample> {
        self.samples.last()
    }

    /// Tracking statuses in the order they were entered.
    pub fn tracking_statuses(&self) -> Vec<TrackingStatus> {
        self.transitions
            .iter()
            .filter_map(|transition| match transition.change {
                StatusChange::Tracking(status) => Some(status),
                StatusChange::Ride(_) => None,
            })
            .collect()
    }

    /// Time the given tracking status was first entered.
    pub fn entered_at(&self, status: TrackingStatus) -> Option<u64> {
        self.transitions
            .iter()
            .find(|transition| transition.change == StatusChange::Tracking(status))
            .map(|transition| transition.timestamp_ms)
    }
}
