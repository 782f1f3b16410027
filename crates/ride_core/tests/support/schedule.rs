use bevy_ecs::prelude::World;
use bevy_ecs::schedule::Schedule;
use ride_core::runner::{ride_schedule, run_for};

/// Owns the session schedule so tracking tests can drive a bare world by time.
pub struct ScheduleRunner {
    schedule: Schedule,
}

impl Default for ScheduleRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleRunner {
    pub fn new() -> Self {
        Self {
            schedule: ride_schedule(),
        }
    }

    /// Fire every event due within the next `duration_ms`.
    pub fn run_for(&mut self, world: &mut World, duration_ms: u64) -> usize {
        run_for(world, &mut self.schedule, duration_ms)
    }
}
