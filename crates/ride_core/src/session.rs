//! A rider session: the world holding every store plus the schedule that
//! reacts to timers. Every user action is a method; time only passes through
//! [`RideSession::advance_by`] and friends.

use bevy_ecs::prelude::{Mut, Schedule, World};
use tracing::{debug, info};

use crate::clock::{EventKind, SimulationClock};
use crate::config::{BookingConfig, RideConfig, TrackingConfig};
use crate::error::{AuthError, GeolocationError, RideError, StorageError};
use crate::geo::{GeoPoint, Location};
use crate::pricing::{Receipt, RideType};
use crate::ride::{Ride, RideStatus, TrackingStatus};
use crate::runner::{ride_schedule, run_for, run_until, run_until_empty};
use crate::scenario::build_scenario;
use crate::storage::{has_onboarded, mark_onboarded, ClientStorage, KeyValueStorage, MemoryStorage};
use crate::store::{
    AuthStore, Completion, NotificationKind, NotificationStore, PendingBooking, RideStore,
    UserPatch,
};
use crate::systems::FlowTimers;
use crate::telemetry::{RideTelemetry, StatusChange};
use crate::tracking::TrackingState;

pub struct RideSession {
    world: World,
    schedule: Schedule,
}

impl RideSession {
    /// Session backed by in-memory client storage.
    pub fn new(config: RideConfig) -> Self {
        Self::with_storage(config, Box::new(MemoryStorage::new()))
    }

    /// Session backed by the given client storage; a persisted sign-in is restored.
    pub fn with_storage(config: RideConfig, storage: Box<dyn KeyValueStorage>) -> Self {
        let mut world = World::new();
        build_scenario(&mut world, &config, storage);
        Self {
            world,
            schedule: ride_schedule(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn clock(&self) -> &SimulationClock {
        self.world.resource::<SimulationClock>()
    }

    /// Virtual milliseconds since the session started.
    pub fn now(&self) -> u64 {
        self.clock().now()
    }

    pub fn rides(&self) -> &RideStore {
        self.world.resource::<RideStore>()
    }

    pub fn tracking(&self) -> &TrackingState {
        self.world.resource::<TrackingState>()
    }

    pub fn notifications(&self) -> &NotificationStore {
        self.world.resource::<NotificationStore>()
    }

    pub fn notifications_mut(&mut self) -> Mut<'_, NotificationStore> {
        self.world.resource_mut::<NotificationStore>()
    }

    pub fn auth(&self) -> &AuthStore {
        self.world.resource::<AuthStore>()
    }

    pub fn telemetry(&self) -> &RideTelemetry {
        self.world.resource::<RideTelemetry>()
    }

    pub fn set_pickup(&mut self, location: Location) {
        self.world.resource_mut::<RideStore>().set_pickup(location);
    }

    pub fn clear_pickup(&mut self) {
        self.world.resource_mut::<RideStore>().clear_pickup();
    }

    pub fn set_destination(&mut self, location: Location) {
        self.world.resource_mut::<RideStore>().set_destination(location);
    }

    pub fn clear_destination(&mut self) {
        self.world.resource_mut::<RideStore>().clear_destination();
    }

    pub fn set_ride_type(&mut self, ride_type: RideType) {
        self.world.resource_mut::<RideStore>().set_ride_type(ride_type);
    }

    pub fn set_shared_ride(&mut self, shared: bool) {
        self.world.resource_mut::<RideStore>().set_shared_ride(shared);
    }

    pub fn set_split_count(&mut self, count: i64) {
        self.world.resource_mut::<RideStore>().set_split_count(count);
    }

    pub fn use_current_location(&mut self, fix: Result<GeoPoint, GeolocationError>) {
        self.world
            .resource_mut::<RideStore>()
            .use_current_location(fix);
    }

    /// Snapshots the planning fields and schedules the confirmation.
    pub fn request_booking(&mut self) -> Result<PendingBooking, RideError> {
        let booking = self.world.resource_mut::<RideStore>().begin_booking()?;
        let delay_ms = self.world.resource::<BookingConfig>().booking_delay_ms;

        let mut clock = self.world.resource_mut::<SimulationClock>();
        let handle = clock.schedule_in(delay_ms, EventKind::BookingConfirmed);
        let now = clock.now();
        self.world.resource_mut::<FlowTimers>().booking = Some(handle);
        self.world.resource_mut::<RideTelemetry>().record_transition(
            now,
            None,
            StatusChange::Ride(RideStatus::Pending),
        );
        info!(
            fare = booking.fare,
            ride_type = %booking.ride_type,
            shared = booking.shared_ride,
            "booking requested"
        );
        Ok(booking)
    }

    /// Cancels the booking in flight or the active ride, clearing search, notice
    /// and tracking timers. Returns the cancelled ride, or `None` when only an
    /// unconfirmed booking was dropped.
    pub fn cancel_ride(&mut self) -> Result<Option<Ride>, RideError> {
        let store = self.world.resource::<RideStore>();
        let has_booking = store.pending_booking().is_some();
        let has_active_ride = store.current_ride().is_some_and(Ride::is_active);
        if !has_booking && !has_active_ride {
            return Err(RideError::NoCurrentRide);
        }

        self.world
            .resource_scope(|world, mut clock: Mut<SimulationClock>| {
                let cancelled = world
                    .resource_mut::<FlowTimers>()
                    .cancel_ride_timers(&mut clock)
                    + world.resource_mut::<TrackingState>().stop(&mut clock);
                debug!(cancelled, "ride timers cancelled");
            });

        let ride = self
            .world
            .resource_mut::<RideStore>()
            .cancel_ride()
            .cloned();
        if let Some(ride) = &ride {
            let now = self.now();
            self.world.resource_mut::<RideTelemetry>().record_transition(
                now,
                Some(&ride.id),
                StatusChange::Ride(RideStatus::Cancelled),
            );
        }
        Ok(ride)
    }

    /// (Re)starts the approach simulation for the current ride, e.g. when the
    /// tracking screen is shown again. Returns whether the timers were armed.
    pub fn start_tracking(&mut self) -> bool {
        let store = self.world.resource::<RideStore>();
        let pickup = store
            .current_ride()
            .map(|ride| ride.pickup.point())
            .or_else(|| store.pickup().map(Location::point));
        let config = *self.world.resource::<TrackingConfig>();

        let started = self
            .world
            .resource_scope(|world, mut clock: Mut<SimulationClock>| {
                world
                    .resource_mut::<TrackingState>()
                    .start(&mut clock, &config, pickup)
            });
        if started {
            let now = self.now();
            let ride_id = self.rides().current_ride().map(|ride| ride.id.clone());
            self.world.resource_mut::<RideTelemetry>().record_transition(
                now,
                ride_id.as_deref(),
                StatusChange::Tracking(TrackingStatus::Arriving),
            );
        }
        started
    }

    /// Stops the tracking timers without touching the ride.
    pub fn teardown_tracking(&mut self) -> usize {
        self.world
            .resource_scope(|world, mut clock: Mut<SimulationClock>| {
                world.resource_mut::<TrackingState>().stop(&mut clock)
            })
    }

    /// Finalizes the trip and returns the receipt. The completed ride moves to
    /// history and loyalty points are credited.
    pub fn complete_ride(&mut self, completion: Completion) -> Result<Receipt, RideError> {
        let ride_id = match self.rides().current_ride() {
            Some(ride) if ride.status == RideStatus::Cancelled => {
                return Err(RideError::NoCurrentRide)
            }
            Some(ride) => Some(ride.id.clone()),
            None => None,
        };
        let fallback_fare = self.world.resource::<BookingConfig>().fallback_fare;
        let now_real = self.clock().now_real_ms();

        let receipt = self
            .world
            .resource_mut::<RideStore>()
            .complete_ride(completion, now_real, fallback_fare)?;

        self.world
            .resource_scope(|world, mut clock: Mut<SimulationClock>| {
                world
                    .resource_mut::<FlowTimers>()
                    .cancel_ride_timers(&mut clock);
                world.resource_mut::<TrackingState>().complete(&mut clock);
            });

        let mut notifications = self.world.resource_mut::<NotificationStore>();
        notifications.add(
            NotificationKind::PaymentProcessed,
            "Payment Successful",
            format!("Payment of ₹{:.2} completed", receipt.total),
            now_real,
        );
        notifications.add(
            NotificationKind::RideCompleted,
            "Ride Completed",
            format!("You've earned {} loyalty points!", receipt.points_earned),
            now_real,
        );

        let now = self.now();
        let mut telemetry = self.world.resource_mut::<RideTelemetry>();
        telemetry.record_transition(
            now,
            ride_id.as_deref(),
            StatusChange::Tracking(TrackingStatus::Completed),
        );
        telemetry.record_transition(
            now,
            ride_id.as_deref(),
            StatusChange::Ride(RideStatus::Completed),
        );
        info!(
            total = receipt.total,
            loyalty_points = receipt.loyalty_points,
            "ride finalized"
        );
        Ok(receipt)
    }

    /// Starts the simulated history fetch. A fetch already in flight is kept.
    pub fn load_ride_history(&mut self) {
        if self.world.resource::<FlowTimers>().history.is_some() {
            return;
        }
        let delay_ms = self.world.resource::<BookingConfig>().history_load_delay_ms;
        self.world.resource_mut::<RideStore>().begin_history_load();
        let handle = self
            .world
            .resource_mut::<SimulationClock>()
            .schedule_in(delay_ms, EventKind::HistoryLoaded);
        self.world.resource_mut::<FlowTimers>().history = Some(handle);
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        self.world
            .resource_mut::<AuthStore>()
            .begin_login(email, password)?;
        self.schedule_auth();
        Ok(())
    }

    pub fn register(&mut self, name: &str, email: &str, password: &str) -> Result<(), AuthError> {
        self.world
            .resource_mut::<AuthStore>()
            .begin_register(name, email, password)?;
        self.schedule_auth();
        Ok(())
    }

    pub fn logout(&mut self) {
        if let Some(handle) = self.world.resource_mut::<FlowTimers>().auth.take() {
            self.world.resource_mut::<SimulationClock>().cancel(handle);
        }
        self.world.resource_mut::<AuthStore>().logout();
        self.persist_auth();
        info!("signed out");
    }

    pub fn update_user(&mut self, patch: UserPatch) {
        self.world.resource_mut::<AuthStore>().update_user(patch);
        self.persist_auth();
    }

    pub fn has_onboarded(&self) -> Result<bool, StorageError> {
        has_onboarded(&*self.world.resource::<ClientStorage>().0)
    }

    pub fn complete_onboarding(&mut self) -> Result<(), StorageError> {
        mark_onboarded(&mut *self.world.resource_mut::<ClientStorage>().0)
    }

    /// Fires every timer due within the next `duration_ms`. Returns the number of events.
    pub fn advance_by(&mut self, duration_ms: u64) -> usize {
        run_for(&mut self.world, &mut self.schedule, duration_ms)
    }

    /// Fires every timer due at or before `timestamp_ms`.
    pub fn advance_to(&mut self, timestamp_ms: u64) -> usize {
        run_until(&mut self.world, &mut self.schedule, timestamp_ms)
    }

    /// Fires timers until none remain or `max_steps` events ran.
    pub fn run_until_idle(&mut self, max_steps: usize) -> usize {
        run_until_empty(&mut self.world, &mut self.schedule, max_steps)
    }

    fn schedule_auth(&mut self) {
        let delay_ms = self.world.resource::<BookingConfig>().auth_delay_ms;
        let handle = self
            .world
            .resource_mut::<SimulationClock>()
            .schedule_in(delay_ms, EventKind::AuthCompleted);
        self.world.resource_mut::<FlowTimers>().auth = Some(handle);
    }

    fn persist_auth(&mut self) {
        self.world
            .resource_scope(|world, mut storage: Mut<ClientStorage>| {
                world.resource::<AuthStore>().persist(&mut *storage.0);
            });
    }
}

impl Default for RideSession {
    fn default() -> Self {
        Self::new(RideConfig::default())
    }
}

impl std::fmt::Debug for RideSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RideSession")
            .field("now", &self.now())
            .finish_non_exhaustive()
    }
}
