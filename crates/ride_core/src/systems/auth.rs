use bevy_ecs::prelude::{Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::storage::ClientStorage;
use crate::store::AuthStore;
use crate::systems::FlowTimers;

/// Completes the mock login/registration round-trip and persists the session.
pub fn auth_completed_system(
    event: Res<CurrentEvent>,
    clock: Res<SimulationClock>,
    mut auth: ResMut<AuthStore>,
    mut storage: ResMut<ClientStorage>,
    mut timers: ResMut<FlowTimers>,
) {
    if event.0.kind != EventKind::AuthCompleted {
        return;
    }
    if !FlowTimers::take_if(&mut timers.auth, event.0.timer) {
        return;
    }

    if auth.finish_auth(clock.now_real_ms()) {
        auth.persist(&mut *storage.0);
    }
}
