//! Event-reacting systems. Each one runs only for its own [`EventKind`] and
//! ignores firings whose timer handle is no longer the one it armed.
//!
//! [`EventKind`]: crate::clock::EventKind

pub mod auth;
pub mod booking;
pub mod history;
pub mod tracking;

use bevy_ecs::prelude::Resource;

use crate::clock::{SimulationClock, TimerHandle};

/// One-shot timers of the booking flow and the simulated backend calls.
/// Tracking timers live on [`crate::tracking::TrackingState`].
#[derive(Debug, Default, Resource)]
pub struct FlowTimers {
    pub booking: Option<TimerHandle>,
    pub search: Option<TimerHandle>,
    pub arriving_notice: Option<TimerHandle>,
    pub history: Option<TimerHandle>,
    pub auth: Option<TimerHandle>,
}

impl FlowTimers {
    /// Cancels every timer tied to the current ride. Returns how many were still armed.
    pub fn cancel_ride_timers(&mut self, clock: &mut SimulationClock) -> usize {
        [
            self.booking.take(),
            self.search.take(),
            self.arriving_notice.take(),
        ]
        .into_iter()
        .flatten()
        .filter(|handle| clock.cancel(*handle))
        .count()
    }

    /// Clears `slot` if it holds `handle`. Returns whether it did.
    pub(crate) fn take_if(slot: &mut Option<TimerHandle>, handle: TimerHandle) -> bool {
        if *slot == Some(handle) {
            *slot = None;
            true
        } else {
            false
        }
    }
}
