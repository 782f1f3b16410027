use bevy_ecs::prelude::World;
use ride_core::config::RideConfig;
use ride_core::scenario::build_scenario;
use ride_core::session::RideSession;
use ride_core::storage::{KeyValueStorage, MemoryStorage};
use ride_core::test_helpers::{demo_destination, demo_pickup};

/// Helper that builds seeded worlds and sessions for integration tests.
pub struct TestWorldBuilder {
    config: RideConfig,
    storage: Option<Box<dyn KeyValueStorage>>,
    planned: bool,
}

impl Default for TestWorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorldBuilder {
    pub fn new() -> Self {
        Self {
            config: RideConfig::default().with_seed(42),
            storage: None,
            planned: false,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config = self.config.with_seed(seed);
        self
    }

    pub fn with_loyalty_points(mut self, initial_points: u32, points_per_ride: u32) -> Self {
        self.config = self.config.with_loyalty_points(initial_points, points_per_ride);
        self
    }

    pub fn with_search_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config = self.config.with_search_delay_ms(delay_ms);
        self
    }

    /// Disables GPS jitter so driver movement is exact.
    pub fn without_jitter(mut self) -> Self {
        self.config = self.config.with_jitter_deg(0.0);
        self
    }

    pub fn with_initial_offset_deg(mut self, offset_deg: f64) -> Self {
        self.config = self.config.with_initial_offset_deg(offset_deg);
        self
    }

    pub fn with_storage(mut self, storage: Box<dyn KeyValueStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Pre-selects the Connaught Place → Nehru Place trip.
    pub fn with_demo_trip(mut self) -> Self {
        self.planned = true;
        self
    }

    pub fn config(&self) -> RideConfig {
        self.config
    }

    pub fn build(self) -> World {
        let mut world = World::new();
        let storage = self
            .storage
            .unwrap_or_else(|| Box::new(MemoryStorage::new()));
        build_scenario(&mut world, &self.config, storage);
        world
    }

    pub fn build_session(self) -> RideSession {
        let storage = self
            .storage
            .unwrap_or_else(|| Box::new(MemoryStorage::new()));
        let mut session = RideSession::with_storage(self.config, storage);
        if self.planned {
            session.set_pickup(demo_pickup());
            session.set_destination(demo_destination());
        }
        session
    }
}
