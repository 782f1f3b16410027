mod support;

use ride_core::clock::{EventKind, SimulationClock, ONE_SEC_MS};
use ride_core::runner::{ride_schedule, run_until};
use ride_core::systems::FlowTimers;
use support::world::TestWorldBuilder;

#[test]
fn run_until_fires_events_at_the_boundary_and_moves_the_clock() {
    let mut world = TestWorldBuilder::new().build();
    let mut schedule = ride_schedule();
    let handle = world
        .resource_mut::<SimulationClock>()
        .schedule_in(500, EventKind::HistoryLoaded);
    world.resource_mut::<FlowTimers>().history = Some(handle);

    assert_eq!(run_until(&mut world, &mut schedule, 499), 0);
    assert_eq!(world.resource::<SimulationClock>().now(), 499);

    assert_eq!(run_until(&mut world, &mut schedule, 500), 1);
    assert!(world.resource::<FlowTimers>().history.is_none());

    assert_eq!(run_until(&mut world, &mut schedule, 2 * ONE_SEC_MS), 0);
    assert_eq!(world.resource::<SimulationClock>().now(), 2 * ONE_SEC_MS);
}

#[test]
fn cancelled_repeating_timer_never_fires_again() {
    let mut clock = SimulationClock::default();
    let tick = clock.schedule_every(ONE_SEC_MS, EventKind::TrackingTick);
    let check = clock.schedule_every(ONE_SEC_MS, EventKind::ArrivalCheck);

    for _ in 0..4 {
        clock.pop_next().expect("event");
    }
    assert_eq!(clock.now(), 2 * ONE_SEC_MS);

    assert!(clock.cancel(tick));
    assert!(clock.cancel(check));
    assert!(clock.is_empty());
    assert_eq!(clock.next_event_time(), None);
}

#[test]
fn wall_clock_follows_the_configured_epoch() {
    let world = TestWorldBuilder::new().build();
    let clock = world.resource::<SimulationClock>();
    assert_eq!(clock.now(), 0);
    assert_eq!(clock.now_real_ms(), ride_core::clock::DEFAULT_EPOCH_MS);
}
