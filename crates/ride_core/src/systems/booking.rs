use bevy_ecs::prelude::{Res, ResMut};
use tracing::{debug, info};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::config::{BookingConfig, TrackingConfig};
use crate::random::SimRng;
use crate::ride::{RideStatus, TrackingStatus, DRIVER_ROSTER};
use crate::store::{AuthStore, NotificationKind, NotificationStore, RideStore};
use crate::systems::FlowTimers;
use crate::telemetry::{RideTelemetry, StatusChange};
use crate::tracking::TrackingState;

/// Turns the pending booking into a `confirmed` ride and starts the driver search.
#[allow(clippy::too_many_arguments)]
pub fn booking_confirmed_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut rng: ResMut<SimRng>,
    config: Res<BookingConfig>,
    auth: Res<AuthStore>,
    mut store: ResMut<RideStore>,
    mut timers: ResMut<FlowTimers>,
    mut telemetry: ResMut<RideTelemetry>,
) {
    if event.0.kind != EventKind::BookingConfirmed {
        return;
    }
    if !FlowTimers::take_if(&mut timers.booking, event.0.timer) {
        return;
    }

    let Some(ride) = store.confirm_booking(auth.user_id(), clock.now_real_ms()) else {
        return;
    };
    let ride_id = ride.id.clone();
    telemetry.record_transition(
        clock.now(),
        Some(&ride_id),
        StatusChange::Ride(RideStatus::Confirmed),
    );

    let search_ms = rng.delay_ms(config.search_min_ms, config.search_max_ms);
    timers.search = Some(clock.schedule_in(search_ms, EventKind::DriverFound));
    debug!(ride_id = %ride_id, search_ms, "searching for a driver");
}

/// Assigns a driver, issues the OTP and starts the approach simulation.
#[allow(clippy::too_many_arguments)]
pub fn driver_found_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    mut rng: ResMut<SimRng>,
    booking_config: Res<BookingConfig>,
    tracking_config: Res<TrackingConfig>,
    mut store: ResMut<RideStore>,
    mut tracking: ResMut<TrackingState>,
    mut notifications: ResMut<NotificationStore>,
    mut timers: ResMut<FlowTimers>,
    mut telemetry: ResMut<RideTelemetry>,
) {
    if event.0.kind != EventKind::DriverFound {
        return;
    }
    if !FlowTimers::take_if(&mut timers.search, event.0.timer) {
        return;
    }

    let driver = &DRIVER_ROSTER[rng.index(DRIVER_ROSTER.len())];
    let otp = rng.otp();
    let Some(ride) = store.assign_driver(driver, otp) else {
        return;
    };
    let ride_id = ride.id.clone();
    let pickup = ride.pickup.point();
    info!(ride_id = %ride_id, driver = driver.name, "driver assigned");

    notifications.add(
        NotificationKind::DriverFound,
        "Driver Found!",
        format!("{} is on the way to pick you up", driver.name),
        clock.now_real_ms(),
    );
    timers.arriving_notice = Some(clock.schedule_in(
        booking_config.arriving_notice_delay_ms,
        EventKind::DriverArrivingNotice,
    ));

    tracking.start(&mut clock, &tracking_config, Some(pickup));
    telemetry.record_transition(
        clock.now(),
        Some(&ride_id),
        StatusChange::Tracking(TrackingStatus::Arriving),
    );
}

/// Follow-up notice with the live ETA, skipped if the driver already arrived.
pub fn driver_arriving_notice_system(
    event: Res<CurrentEvent>,
    clock: Res<SimulationClock>,
    store: Res<RideStore>,
    tracking: Res<TrackingState>,
    mut notifications: ResMut<NotificationStore>,
    mut timers: ResMut<FlowTimers>,
) {
    if event.0.kind != EventKind::DriverArrivingNotice {
        return;
    }
    if !FlowTimers::take_if(&mut timers.arriving_notice, event.0.timer) {
        return;
    }
    if tracking.status() != TrackingStatus::Arriving {
        return;
    }
    let Some(driver_name) = store.current_ride().and_then(|ride| ride.driver_name.as_deref())
    else {
        return;
    };

    let eta_min = tracking.eta_min();
    let unit = if eta_min == 1 { "minute" } else { "minutes" };
    notifications.add(
        NotificationKind::DriverArriving,
        "Driver Arriving Soon",
        format!("{driver_name} is {eta_min} {unit} away"),
        clock.now_real_ms(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::geo::Location;
    use crate::storage::ClientStorage;

    fn world_with_pending_booking() -> World {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(SimRng::new(Some(11)));
        world.insert_resource(BookingConfig::default());
        world.insert_resource(TrackingConfig::default());
        world.insert_resource(AuthStore::default());
        world.insert_resource(ClientStorage::default());
        world.insert_resource(TrackingState::default());
        world.insert_resource(NotificationStore::default());
        world.insert_resource(RideTelemetry::default());

        let mut store = RideStore::default();
        store.set_pickup(Location::new(28.6139, 77.2090, "Connaught Place").expect("pickup"));
        store.set_destination(Location::new(28.5535, 77.2588, "Nehru Place").expect("dest"));
        store.begin_booking().expect("booking");
        world.insert_resource(store);

        let handle = world
            .resource_mut::<SimulationClock>()
            .schedule_in(1500, EventKind::BookingConfirmed);
        world.insert_resource(FlowTimers {
            booking: Some(handle),
            ..FlowTimers::default()
        });
        world
    }

    fn fire_next(world: &mut World, schedule: &mut Schedule) -> EventKind {
        let event = world
            .resource_mut::<SimulationClock>()
            .pop_next()
            .expect("event");
        world.insert_resource(CurrentEvent(event));
        schedule.run(world);
        event.kind
    }

    #[test]
    fn confirmation_schedules_driver_search_within_window() {
        let mut world = world_with_pending_booking();
        let mut schedule = Schedule::default();
        schedule.add_systems(booking_confirmed_system);

        assert_eq!(fire_next(&mut world, &mut schedule), EventKind::BookingConfirmed);

        let ride = world.resource::<RideStore>().current_ride().cloned().expect("ride");
        assert_eq!(ride.status, RideStatus::Confirmed);
        assert_eq!(ride.user_id, "1");
        assert!(world.resource::<FlowTimers>().search.is_some());

        let clock = world.resource::<SimulationClock>();
        let next = clock.next_event_time().expect("search timer");
        assert!((1500 + 3000..=1500 + 5000).contains(&next));
        assert_eq!(world.resource::<RideTelemetry>().rides_booked, 1);
    }

    #[test]
    fn driver_found_assigns_driver_and_starts_tracking() {
        let mut world = world_with_pending_booking();
        let mut schedule = Schedule::default();
        schedule.add_systems((booking_confirmed_system, driver_found_system));

        fire_next(&mut world, &mut schedule);
        assert_eq!(fire_next(&mut world, &mut schedule), EventKind::DriverFound);

        let ride = world.resource::<RideStore>().current_ride().cloned().expect("ride");
        let name = ride.driver_name.clone().expect("driver name");
        assert!(DRIVER_ROSTER.iter().any(|driver| driver.name == name));
        assert!((1000..=9999).contains(&ride.otp.expect("otp")));

        let notification = world
            .resource::<NotificationStore>()
            .latest(NotificationKind::DriverFound)
            .cloned()
            .expect("notification");
        assert_eq!(notification.title, "Driver Found!");
        assert_eq!(
            notification.message,
            format!("{name} is on the way to pick you up")
        );

        let tracking = world.resource::<TrackingState>();
        assert_eq!(tracking.status(), TrackingStatus::Arriving);
        assert!(tracking.position_timer().is_some());
        assert!(world.resource::<FlowTimers>().arriving_notice.is_some());
    }

    #[test]
    fn stale_confirmation_is_ignored() {
        let mut world = world_with_pending_booking();
        world.resource_mut::<FlowTimers>().booking = None;
        let mut schedule = Schedule::default();
        schedule.add_systems(booking_confirmed_system);

        fire_next(&mut world, &mut schedule);
        assert!(world.resource::<RideStore>().current_ride().is_none());
        assert!(world.resource::<SimulationClock>().is_empty());
    }
}
