//! Populates a session [`World`] with every resource the schedule reads.

use bevy_ecs::prelude::World;
use tracing::debug;

use crate::clock::SimulationClock;
use crate::config::RideConfig;
use crate::random::SimRng;
use crate::storage::{ClientStorage, KeyValueStorage};
use crate::store::{AuthStore, NotificationStore, RideStore};
use crate::systems::FlowTimers;
use crate::telemetry::RideTelemetry;
use crate::tracking::TrackingState;

/// Inserts clock, RNG, configs, stores and telemetry. The auth store is
/// restored from `storage` before the storage becomes a resource.
pub fn build_scenario(world: &mut World, config: &RideConfig, storage: Box<dyn KeyValueStorage>) {
    world.insert_resource(SimulationClock::with_epoch(config.epoch_ms));
    world.insert_resource(SimRng::new(Some(config.seed)));

    world.insert_resource(config.tracking);
    world.insert_resource(config.booking);

    world.insert_resource(RideStore::new(config.pricing, config.loyalty));
    world.insert_resource(TrackingState::default());
    world.insert_resource(NotificationStore::default());
    world.insert_resource(AuthStore::restore(&*storage));
    world.insert_resource(ClientStorage(storage));

    world.insert_resource(FlowTimers::default());
    world.insert_resource(RideTelemetry::default());
    debug!(seed = config.seed, "session world built");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BookingConfig, TrackingConfig};
    use crate::storage::MemoryStorage;

    #[test]
    fn build_scenario_inserts_all_resources() {
        let mut world = World::new();
        let config = RideConfig::default().with_loyalty_points(85, 20);
        build_scenario(&mut world, &config, Box::new(MemoryStorage::new()));

        assert!(world.contains_resource::<SimulationClock>());
        assert!(world.contains_resource::<SimRng>());
        assert!(world.contains_resource::<TrackingConfig>());
        assert!(world.contains_resource::<BookingConfig>());
        assert!(world.contains_resource::<TrackingState>());
        assert!(world.contains_resource::<NotificationStore>());
        assert!(world.contains_resource::<ClientStorage>());
        assert!(world.contains_resource::<FlowTimers>());
        assert!(world.contains_resource::<RideTelemetry>());
        assert_eq!(world.resource::<RideStore>().loyalty_points(), 85);
        assert!(!world.resource::<AuthStore>().is_authenticated());
    }
}
