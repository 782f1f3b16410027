use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::config::TrackingConfig;
use crate::random::SimRng;
use crate::ride::{RideStatus, TrackingStatus};
use crate::store::{NotificationKind, NotificationStore, RideStore};
use crate::telemetry::{RideTelemetry, StatusChange, TrackingSample};
use crate::tracking::TrackingState;

pub fn tracking_tick_system(
    event: Res<CurrentEvent>,
    clock: Res<SimulationClock>,
    config: Res<TrackingConfig>,
    mut rng: ResMut<SimRng>,
    mut tracking: ResMut<TrackingState>,
    mut telemetry: ResMut<RideTelemetry>,
) {
    if event.0.kind != EventKind::TrackingTick {
        return;
    }
    if tracking.position_timer() != Some(event.0.timer) {
        return;
    }

    let Some(update) = tracking.advance(&mut rng, &config) else {
        return;
    };
    telemetry.record_sample(TrackingSample {
        timestamp_ms: clock.now(),
        driver_location: update.driver_location,
        cell: update.driver_location.cell(),
        distance_km: update.distance_km,
        speed_kmh: update.speed_kmh,
        eta_min: update.eta_min,
    });
}

pub fn arrival_check_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    config: Res<TrackingConfig>,
    store: Res<RideStore>,
    mut tracking: ResMut<TrackingState>,
    mut notifications: ResMut<NotificationStore>,
    mut telemetry: ResMut<RideTelemetry>,
) {
    if event.0.kind != EventKind::ArrivalCheck {
        return;
    }
    if tracking.arrival_timer() != Some(event.0.timer) {
        return;
    }
    if !tracking.check_arrival(&mut clock, &config) {
        return;
    }

    let ride = store.current_ride();
    let driver_name = ride
        .and_then(|ride| ride.driver_name.as_deref())
        .unwrap_or("Your driver");
    notifications.add(
        NotificationKind::DriverArrived,
        "Driver Arrived",
        format!("{driver_name} has arrived at your pickup location"),
        clock.now_real_ms(),
    );
    telemetry.record_transition(
        clock.now(),
        ride.map(|ride| ride.id.as_str()),
        StatusChange::Tracking(TrackingStatus::Arrived),
    );
}

/// The arrived → in-progress hop.
pub fn ride_started_system(
    event: Res<CurrentEvent>,
    clock: Res<SimulationClock>,
    mut store: ResMut<RideStore>,
    mut tracking: ResMut<TrackingState>,
    mut notifications: ResMut<NotificationStore>,
    mut telemetry: ResMut<RideTelemetry>,
) {
    if event.0.kind != EventKind::RideStarted {
        return;
    }
    if tracking.start_timer() != Some(event.0.timer) {
        return;
    }
    if !tracking.begin_ride() {
        return;
    }

    let now = clock.now();
    telemetry.record_transition(now, None, StatusChange::Tracking(TrackingStatus::InProgress));
    store.mark_in_progress();
    let Some(ride) = store.current_ride() else {
        return;
    };
    telemetry.record_transition(
        now,
        Some(&ride.id),
        StatusChange::Ride(RideStatus::InProgress),
    );
    notifications.add(
        NotificationKind::RideStarted,
        "Ride Started",
        format!("You're on your way to {}", ride.destination.address),
        clock.now_real_ms(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::geo::GeoPoint;

    fn pickup() -> GeoPoint {
        GeoPoint {
            lat: 28.6139,
            lng: 77.2090,
        }
    }

    fn tracking_world(driver_location: GeoPoint) -> World {
        let mut world = World::new();
        let config = TrackingConfig::default();
        let mut clock = SimulationClock::default();
        let mut tracking = TrackingState::default();
        tracking.start_from(&mut clock, &config, pickup(), driver_location);

        world.insert_resource(clock);
        world.insert_resource(config);
        world.insert_resource(tracking);
        world.insert_resource(SimRng::new(Some(21)));
        world.insert_resource(RideStore::default());
        world.insert_resource(NotificationStore::default());
        world.insert_resource(RideTelemetry::default());
        world
    }

    fn tracking_schedule() -> Schedule {
        let mut schedule = Schedule::default();
        schedule.add_systems((tracking_tick_system, arrival_check_system, ride_started_system));
        schedule
    }

    fn step(world: &mut World, schedule: &mut Schedule) -> Option<EventKind> {
        let event = world.resource_mut::<SimulationClock>().pop_next()?;
        world.insert_resource(CurrentEvent(event));
        schedule.run(world);
        Some(event.kind)
    }

    #[test]
    fn tick_records_a_sample() {
        let mut world = tracking_world(pickup().offset(0.01, 0.01));
        let mut schedule = tracking_schedule();

        assert_eq!(step(&mut world, &mut schedule), Some(EventKind::TrackingTick));
        let telemetry = world.resource::<RideTelemetry>();
        let sample = telemetry.last_sample().expect("sample");
        assert_eq!(sample.timestamp_ms, 1000);
        assert!(sample.cell.is_some());
        assert_eq!(
            world.resource::<TrackingState>().distance_km(),
            sample.distance_km
        );
    }

    #[test]
    fn driver_at_pickup_arrives_then_starts_ride() {
        let mut world = tracking_world(pickup());
        let mut schedule = tracking_schedule();

        step(&mut world, &mut schedule);
        assert_eq!(step(&mut world, &mut schedule), Some(EventKind::ArrivalCheck));
        assert_eq!(
            world.resource::<TrackingState>().status(),
            TrackingStatus::Arrived
        );
        assert!(world
            .resource::<NotificationStore>()
            .latest(NotificationKind::DriverArrived)
            .is_some());

        assert_eq!(step(&mut world, &mut schedule), Some(EventKind::RideStarted));
        assert_eq!(world.resource::<SimulationClock>().now(), 4000);
        assert_eq!(
            world.resource::<TrackingState>().status(),
            TrackingStatus::InProgress
        );
        assert_eq!(step(&mut world, &mut schedule), None);
        assert_eq!(
            world.resource::<RideTelemetry>().tracking_statuses(),
            vec![TrackingStatus::Arrived, TrackingStatus::InProgress]
        );
    }
}
