//! Trip-planning state and the ride lifecycle.
//!
//! The store is a plain state container: every mutation is synchronous and the
//! estimated fare is recomputed from `(pickup, destination, ride_type)` whenever
//! one of them changes. Anything that takes time (booking confirmation, history
//! loading) is split into a `begin_*` / `finish_*` pair driven by the clock.

use bevy_ecs::prelude::Resource;
use tracing::{debug, info, warn};

use crate::config::LoyaltyConfig;
use crate::error::{GeolocationError, RideError};
use crate::geo::{GeoPoint, Location};
use crate::pricing::{clamp_split_count, PricingConfig, Receipt, RideType, MIN_SPLIT_COUNT};
use crate::ride::{DriverProfile, Ride, RideStatus};

pub const CURRENT_LOCATION_LABEL: &str = "Current Location";

/// Everything captured when the rider taps "Book": later edits to the planning
/// fields do not affect the ride being confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingBooking {
    pub pickup: Location,
    pub destination: Location,
    pub ride_type: RideType,
    /// Loyalty-discounted estimate.
    pub fare: f64,
    pub shared_ride: bool,
    pub split_count: u8,
}

/// Rider input on the completion screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub rating: u8,
    pub feedback: Option<String>,
    pub tip: f64,
}

impl Completion {
    pub fn new(rating: u8) -> Self {
        Self {
            rating,
            feedback: None,
            tip: 0.0,
        }
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    pub fn with_tip(mut self, tip: f64) -> Self {
        self.tip = tip;
        self
    }
}

#[derive(Debug, Resource)]
pub struct RideStore {
    pricing: PricingConfig,
    current_ride: Option<Ride>,
    ride_history: Vec<Ride>,
    pickup: Option<Location>,
    destination: Option<Location>,
    selected_ride_type: RideType,
    estimated_fare: f64,
    shared_ride: bool,
    split_count: u8,
    loyalty_points: u32,
    points_per_ride: u32,
    is_loading: bool,
    pending_booking: Option<PendingBooking>,
    rides_created: u64,
}

impl Default for RideStore {
    fn default() -> Self {
        Self::new(PricingConfig::default(), LoyaltyConfig::default())
    }
}

impl RideStore {
    pub fn new(pricing: PricingConfig, loyalty: LoyaltyConfig) -> Self {
        Self {
            pricing,
            current_ride: None,
            ride_history: Vec::new(),
            pickup: None,
            destination: None,
            selected_ride_type: RideType::default(),
            estimated_fare: 0.0,
            shared_ride: false,
            split_count: MIN_SPLIT_COUNT,
            loyalty_points: loyalty.initial_points,
            points_per_ride: loyalty.points_per_ride,
            is_loading: false,
            pending_booking: None,
            rides_created: 0,
        }
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    pub fn current_ride(&self) -> Option<&Ride> {
        self.current_ride.as_ref()
    }

    pub fn ride_history(&self) -> &[Ride] {
        &self.ride_history
    }

    pub fn pickup(&self) -> Option<&Location> {
        self.pickup.as_ref()
    }

    pub fn destination(&self) -> Option<&Location> {
        self.destination.as_ref()
    }

    pub fn selected_ride_type(&self) -> RideType {
        self.selected_ride_type
    }

    pub fn estimated_fare(&self) -> f64 {
        self.estimated_fare
    }

    pub fn shared_ride(&self) -> bool {
        self.shared_ride
    }

    pub fn split_count(&self) -> u8 {
        self.split_count
    }

    pub fn loyalty_points(&self) -> u32 {
        self.loyalty_points
    }

    pub fn points_per_ride(&self) -> u32 {
        self.points_per_ride
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn pending_booking(&self) -> Option<&PendingBooking> {
        self.pending_booking.as_ref()
    }

    pub fn set_pickup(&mut self, location: Location) {
        self.pickup = Some(location);
        self.calculate_fare();
    }

    pub fn clear_pickup(&mut self) {
        self.pickup = None;
        self.calculate_fare();
    }

    pub fn set_destination(&mut self, location: Location) {
        self.destination = Some(location);
        self.calculate_fare();
    }

    pub fn clear_destination(&mut self) {
        self.destination = None;
        self.calculate_fare();
    }

    pub fn set_ride_type(&mut self, ride_type: RideType) {
        self.selected_ride_type = ride_type;
        self.calculate_fare();
    }

    pub fn set_shared_ride(&mut self, shared: bool) {
        self.shared_ride = shared;
    }

    pub fn set_split_count(&mut self, count: i64) {
        self.split_count = clamp_split_count(count);
    }

    /// Applies a device position fix. Failures leave pickup untouched so the rider
    /// can type an address instead.
    pub fn use_current_location(&mut self, fix: Result<GeoPoint, GeolocationError>) {
        match fix {
            Ok(point) => self.set_pickup(Location::at(point, CURRENT_LOCATION_LABEL)),
            Err(error) => warn!(%error, "geolocation unavailable; pickup left unset"),
        }
    }

    pub fn loyalty_discount_percent(&self) -> f64 {
        self.pricing.loyalty_discount_percent(self.loyalty_points)
    }

    pub fn apply_loyalty_discount(&self, fare: f64) -> f64 {
        self.pricing.apply_loyalty_discount(fare, self.loyalty_points)
    }

    /// Loyalty-discounted fare for an arbitrary ride type with the current locations.
    pub fn quote(&self, ride_type: RideType) -> f64 {
        let fare = self.pricing.estimate_fare(
            self.pickup.as_ref(),
            self.destination.as_ref(),
            ride_type,
        );
        self.apply_loyalty_discount(fare)
    }

    fn calculate_fare(&mut self) {
        self.estimated_fare = self.pricing.estimate_fare(
            self.pickup.as_ref(),
            self.destination.as_ref(),
            self.selected_ride_type,
        );
        debug!(
            estimated_fare = self.estimated_fare,
            ride_type = %self.selected_ride_type,
            "fare recalculated"
        );
    }

    /// Snapshots the planning fields and marks the store as loading.
    pub fn begin_booking(&mut self) -> Result<PendingBooking, RideError> {
        if self.pending_booking.is_some() {
            return Err(RideError::BookingInProgress);
        }
        let pickup = self.pickup.clone().ok_or(RideError::MissingPickup)?;
        let destination = self.destination.clone().ok_or(RideError::MissingDestination)?;
        let booking = PendingBooking {
            pickup,
            destination,
            ride_type: self.selected_ride_type,
            fare: self.apply_loyalty_discount(self.estimated_fare),
            shared_ride: self.shared_ride,
            split_count: self.split_count,
        };
        self.is_loading = true;
        self.pending_booking = Some(booking.clone());
        Ok(booking)
    }

    /// Turns the pending booking into the current ride with status `confirmed`.
    pub fn confirm_booking(&mut self, user_id: &str, created_at: i64) -> Option<&Ride> {
        let booking = self.pending_booking.take()?;
        self.is_loading = false;
        self.rides_created += 1;
        let ride = Ride {
            id: format!("{created_at}-{}", self.rides_created),
            user_id: user_id.to_string(),
            driver_id: None,
            driver_name: None,
            driver_rating: None,
            pickup: booking.pickup,
            destination: booking.destination,
            ride_type: booking.ride_type,
            fare: booking.fare,
            shared_ride: booking.shared_ride,
            split_count: booking.shared_ride.then_some(booking.split_count),
            status: RideStatus::Confirmed,
            created_at,
            completed_at: None,
            rating: None,
            feedback: None,
            otp: None,
        };
        info!(ride_id = %ride.id, fare = ride.fare, ride_type = %ride.ride_type, "ride confirmed");
        self.current_ride = Some(ride);
        self.current_ride.as_ref()
    }

    pub fn assign_driver(&mut self, driver: &DriverProfile, otp: u16) -> Option<&Ride> {
        let ride = self.current_ride.as_mut()?;
        ride.assign_driver(driver);
        ride.otp = Some(otp);
        Some(ride)
    }

    pub fn mark_in_progress(&mut self) {
        if let Some(ride) = self.current_ride.as_mut() {
            ride.status = RideStatus::InProgress;
        }
    }

    /// Cancels the current ride (kept as the current ride with status `cancelled`)
    /// and drops any booking still waiting for confirmation.
    pub fn cancel_ride(&mut self) -> Option<&Ride> {
        if self.pending_booking.take().is_some() {
            self.is_loading = false;
        }
        let ride = self.current_ride.as_mut().filter(|ride| ride.is_active())?;
        ride.status = RideStatus::Cancelled;
        info!(ride_id = %ride.id, "ride cancelled");
        Some(ride)
    }

    /// Finalizes the trip: records rating and feedback, moves the ride into history,
    /// credits loyalty points and resets the planning fields.
    ///
    /// The receipt uses the ride's own fare, so a discount unlocked by the points
    /// credited here only applies from the next booking.
    pub fn complete_ride(
        &mut self,
        completion: Completion,
        completed_at: i64,
        fallback_fare: f64,
    ) -> Result<Receipt, RideError> {
        if !(1..=5).contains(&completion.rating) {
            return Err(RideError::InvalidRating(completion.rating));
        }
        if !completion.tip.is_finite() || completion.tip < 0.0 {
            return Err(RideError::InvalidTip(completion.tip));
        }

        let (fare, split_count) = match self.current_ride.as_ref() {
            Some(ride) => (ride.fare, ride.split_count),
            None if self.estimated_fare > 0.0 => (self.estimated_fare, None),
            None => (fallback_fare, None),
        };

        if self.pending_booking.take().is_some() {
            self.is_loading = false;
        }
        self.loyalty_points = self.loyalty_points.saturating_add(self.points_per_ride);
        if let Some(mut ride) = self.current_ride.take() {
            ride.status = RideStatus::Completed;
            ride.completed_at = Some(completed_at);
            ride.rating = Some(completion.rating);
            ride.feedback = completion.feedback;
            info!(ride_id = %ride.id, rating = completion.rating, "ride completed");
            self.ride_history.insert(0, ride);
        }

        self.pickup = None;
        self.destination = None;
        self.estimated_fare = 0.0;
        self.shared_ride = false;
        self.split_count = MIN_SPLIT_COUNT;

        Ok(Receipt::new(
            fare,
            split_count,
            completion.tip,
            self.points_per_ride,
            self.loyalty_points,
        ))
    }

    pub fn begin_history_load(&mut self) {
        self.is_loading = true;
    }

    /// Appends fetched rides after the ones already known, skipping duplicates.
    pub fn finish_history_load(&mut self, fetched: Vec<Ride>) {
        for ride in fetched {
            if !self.ride_history.iter().any(|known| known.id == ride.id) {
                self.ride_history.push(ride);
            }
        }
        self.is_loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ride::DRIVER_ROSTER;

    fn connaught_place() -> Location {
        Location::new(28.6139, 77.2090, "Connaught Place").expect("location")
    }

    fn nehru_place() -> Location {
        Location::new(28.5535, 77.2588, "Nehru Place").expect("location")
    }

    fn planned_store(points: u32) -> RideStore {
        let mut store = RideStore::new(
            PricingConfig::default(),
            LoyaltyConfig {
                initial_points: points,
                points_per_ride: 20,
            },
        );
        store.set_pickup(connaught_place());
        store.set_destination(nehru_place());
        store
    }

    #[test]
    fn fare_recomputes_on_every_input_change() {
        let mut store = RideStore::default();
        assert_eq!(store.estimated_fare(), 0.0);

        store.set_pickup(connaught_place());
        assert_eq!(store.estimated_fare(), 0.0, "destination still missing");

        store.set_destination(nehru_place());
        assert_eq!(store.estimated_fare(), 18.03);

        store.set_ride_type(RideType::Suv);
        let suv = store.estimated_fare();
        assert!(suv > 18.03);

        store.clear_pickup();
        assert_eq!(store.estimated_fare(), 0.0);
    }

    #[test]
    fn split_count_stays_in_range() {
        let mut store = RideStore::default();
        for (requested, expected) in [(1, 2), (2, 2), (3, 3), (4, 4), (5, 4), (-3, 2)] {
            store.set_split_count(requested);
            assert_eq!(store.split_count(), expected);
        }
    }

    #[test]
    fn booking_requires_both_locations() {
        let mut store = RideStore::default();
        assert_eq!(store.begin_booking(), Err(RideError::MissingPickup));
        store.set_pickup(connaught_place());
        assert_eq!(store.begin_booking(), Err(RideError::MissingDestination));
        assert!(!store.is_loading());
    }

    #[test]
    fn booking_snapshots_planning_fields() {
        let mut store = planned_store(40);
        store.set_shared_ride(true);
        store.set_split_count(3);
        let booking = store.begin_booking().expect("booking");
        assert!(store.is_loading());
        assert_eq!(store.begin_booking(), Err(RideError::BookingInProgress));

        store.set_ride_type(RideType::Premium);
        let ride = store.confirm_booking("1", 1_000).expect("ride").clone();
        assert_eq!(ride.ride_type, booking.ride_type);
        assert_eq!(ride.ride_type, RideType::Economy);
        assert_eq!(ride.fare, 18.03);
        assert_eq!(ride.status, RideStatus::Confirmed);
        assert_eq!(ride.split_count, Some(3));
        assert!(!store.is_loading());
    }

    #[test]
    fn split_count_only_recorded_for_shared_rides() {
        let mut store = planned_store(40);
        store.set_split_count(4);
        store.begin_booking().expect("booking");
        let ride = store.confirm_booking("1", 1).expect("ride");
        assert!(!ride.shared_ride);
        assert_eq!(ride.split_count, None);
    }

    #[test]
    fn booked_fare_carries_loyalty_discount() {
        let mut store = planned_store(120);
        assert_eq!(store.estimated_fare(), 18.03, "estimate stays undiscounted");
        store.begin_booking().expect("booking");
        let ride = store.confirm_booking("1", 1).expect("ride");
        assert_eq!(ride.fare, 16.23);
    }

    #[test]
    fn cancel_marks_current_ride_cancelled() {
        let mut store = planned_store(40);
        store.begin_booking().expect("booking");
        store.confirm_booking("1", 1);
        store.assign_driver(&DRIVER_ROSTER[0], 4321);

        let ride = store.cancel_ride().expect("ride");
        assert_eq!(ride.status, RideStatus::Cancelled);
        assert_eq!(ride.driver_name.as_deref(), Some("Rajesh Kumar"));
        assert!(store.ride_history().is_empty());
    }

    #[test]
    fn cancel_before_confirmation_drops_the_booking() {
        let mut store = planned_store(40);
        store.begin_booking().expect("booking");
        assert!(store.cancel_ride().is_none());
        assert!(store.pending_booking().is_none());
        assert!(!store.is_loading());
        assert!(store.confirm_booking("1", 1).is_none());
    }

    #[test]
    fn cancelling_a_rebooking_leaves_the_earlier_cancelled_ride_alone() {
        let mut store = planned_store(40);
        store.begin_booking().expect("booking");
        store.confirm_booking("1", 1);
        assert!(store.cancel_ride().is_some());

        store.begin_booking().expect("second booking");
        assert!(store.cancel_ride().is_none());
        assert!(store.pending_booking().is_none());
        assert_eq!(store.current_ride().map(|ride| ride.id.as_str()), Some("1-1"));
        assert!(store.cancel_ride().is_none());
    }

    #[test]
    fn completion_unlocks_discount_for_the_next_ride_only() {
        let mut store = planned_store(85);
        store.begin_booking().expect("booking");
        store.confirm_booking("1", 1);

        let receipt = store
            .complete_ride(Completion::new(5).with_feedback("Clean car"), 2, 15.5)
            .expect("receipt");
        assert_eq!(receipt.fare, 18.03, "completed ride was booked below threshold");
        assert_eq!(receipt.loyalty_points, 105);
        assert_eq!(store.loyalty_points(), 105);

        let completed = &store.ride_history()[0];
        assert_eq!(completed.status, RideStatus::Completed);
        assert_eq!(completed.rating, Some(5));
        assert_eq!(completed.feedback.as_deref(), Some("Clean car"));
        assert!(store.current_ride().is_none());
        assert!(store.pickup().is_none());
        assert_eq!(store.estimated_fare(), 0.0);

        store.set_pickup(connaught_place());
        store.set_destination(nehru_place());
        assert_eq!(store.apply_loyalty_discount(store.estimated_fare()), 16.23);
    }

    #[test]
    fn completion_resets_shared_ride_fields() {
        let mut store = planned_store(40);
        store.set_shared_ride(true);
        store.set_split_count(4);
        store.begin_booking().expect("booking");
        store.confirm_booking("1", 1);

        let receipt = store
            .complete_ride(Completion::new(4).with_tip(20.0), 2, 15.5)
            .expect("receipt");
        assert_eq!(receipt.split_count, Some(4));
        assert_eq!(receipt.per_person_fare, 4.51);
        assert_eq!(receipt.total, 24.51);
        assert!(!store.shared_ride());
        assert_eq!(store.split_count(), 2);
    }

    #[test]
    fn completion_without_ride_still_credits_points() {
        let mut store = RideStore::default();
        let receipt = store
            .complete_ride(Completion::new(3), 2, 15.5)
            .expect("receipt");
        assert_eq!(receipt.fare, 15.5);
        assert_eq!(store.loyalty_points(), 60);
        assert!(store.ride_history().is_empty());
    }

    #[test]
    fn completion_rejects_bad_input() {
        let mut store = RideStore::default();
        assert_eq!(
            store.complete_ride(Completion::new(0), 1, 15.5),
            Err(RideError::InvalidRating(0))
        );
        assert_eq!(
            store.complete_ride(Completion::new(6), 1, 15.5),
            Err(RideError::InvalidRating(6))
        );
        assert!(matches!(
            store.complete_ride(Completion::new(5).with_tip(-1.0), 1, 15.5),
            Err(RideError::InvalidTip(_))
        ));
        assert_eq!(store.loyalty_points(), 40);
    }

    #[test]
    fn geolocation_failure_keeps_pickup_unset() {
        let mut store = RideStore::default();
        store.use_current_location(Err(GeolocationError::PermissionDenied));
        assert!(store.pickup().is_none());

        store.use_current_location(Ok(GeoPoint {
            lat: 28.6,
            lng: 77.2,
        }));
        assert_eq!(
            store.pickup().map(|p| p.address.as_str()),
            Some(CURRENT_LOCATION_LABEL)
        );
    }

    #[test]
    fn history_load_merges_without_duplicates() {
        let mut store = planned_store(40);
        store.begin_booking().expect("booking");
        store.confirm_booking("1", 1);
        store
            .complete_ride(Completion::new(5), 2, 15.5)
            .expect("receipt");

        store.begin_history_load();
        assert!(store.is_loading());
        store.finish_history_load(crate::ride::demo_ride_history("1"));
        store.finish_history_load(crate::ride::demo_ride_history("1"));
        assert!(!store.is_loading());

        let ids: Vec<_> = store.ride_history().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(&ids[1..], ["ride-1", "ride-2"]);
    }
}
