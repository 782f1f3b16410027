//! Session runner: advances the clock and routes events into the ECS.
//!
//! Each step pops the next event from [SimulationClock], inserts it as
//! [CurrentEvent], then runs the schedule. Time only moves here, so callers
//! decide how far the session runs.

use bevy_ecs::prelude::{Res, Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;

use crate::clock::{CurrentEvent, Event, EventKind, SimulationClock};
use crate::systems::{
    auth::auth_completed_system,
    booking::{booking_confirmed_system, driver_arriving_notice_system, driver_found_system},
    history::history_loaded_system,
    tracking::{arrival_check_system, ride_started_system, tracking_tick_system},
};

fn is_booking_confirmed(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::BookingConfirmed)
        .unwrap_or(false)
}

fn is_driver_found(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::DriverFound)
        .unwrap_or(false)
}

fn is_driver_arriving_notice(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::DriverArrivingNotice)
        .unwrap_or(false)
}

fn is_tracking_tick(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::TrackingTick)
        .unwrap_or(false)
}

fn is_arrival_check(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::ArrivalCheck)
        .unwrap_or(false)
}

fn is_ride_started(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::RideStarted)
        .unwrap_or(false)
}

fn is_history_loaded(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::HistoryLoaded)
        .unwrap_or(false)
}

fn is_auth_completed(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::AuthCompleted)
        .unwrap_or(false)
}

/// Runs one step: pops the next event, inserts it as [CurrentEvent], then runs the schedule.
/// Returns `false` if the clock was empty.
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> bool {
    run_next_event_with_hook(world, schedule, |_, _| {})
}

/// Runs one step and invokes `hook` after the schedule completes.
pub fn run_next_event_with_hook<F>(world: &mut World, schedule: &mut Schedule, mut hook: F) -> bool
where
    F: FnMut(&World, &Event),
{
    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(e) => e,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event));
    schedule.run(world);
    hook(world, &event);
    true
}

/// Fires every event due at or before `until_ms`, then moves the clock to `until_ms`.
/// Returns the number of events processed.
pub fn run_until(world: &mut World, schedule: &mut Schedule, until_ms: u64) -> usize {
    let mut steps = 0;
    loop {
        let next = world.resource::<SimulationClock>().next_event_time();
        match next {
            Some(timestamp) if timestamp <= until_ms => {
                if !run_next_event(world, schedule) {
                    break;
                }
                steps += 1;
            }
            _ => break,
        }
    }
    world.resource_mut::<SimulationClock>().advance_to(until_ms);
    steps
}

/// Fires every event due within the next `duration_ms`.
pub fn run_for(world: &mut World, schedule: &mut Schedule, duration_ms: u64) -> usize {
    let until_ms = world
        .resource::<SimulationClock>()
        .now()
        .saturating_add(duration_ms);
    run_until(world, schedule, until_ms)
}

/// Runs steps until the event queue is empty or `max_steps` is reached.
/// Returns the number of steps executed.
pub fn run_until_empty(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule) {
        steps += 1;
    }
    steps
}

/// Builds the session schedule: one system per event kind, each gated on its kind.
pub fn ride_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((
        booking_confirmed_system.run_if(is_booking_confirmed),
        driver_found_system.run_if(is_driver_found),
        driver_arriving_notice_system.run_if(is_driver_arriving_notice),
        tracking_tick_system.run_if(is_tracking_tick),
        arrival_check_system.run_if(is_arrival_check),
        ride_started_system.run_if(is_ride_started),
        history_loaded_system.run_if(is_history_loaded),
        auth_completed_system.run_if(is_auth_completed),
    ));
    schedule
}
