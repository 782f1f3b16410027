use bevy_ecs::prelude::{Res, ResMut};
use tracing::info;

use crate::clock::{CurrentEvent, EventKind};
use crate::ride::demo_ride_history;
use crate::store::{AuthStore, RideStore};
use crate::systems::FlowTimers;

pub fn history_loaded_system(
    event: Res<CurrentEvent>,
    auth: Res<AuthStore>,
    mut store: ResMut<RideStore>,
    mut timers: ResMut<FlowTimers>,
) {
    if event.0.kind != EventKind::HistoryLoaded {
        return;
    }
    if !FlowTimers::take_if(&mut timers.history, event.0.timer) {
        return;
    }

    store.finish_history_load(demo_ride_history(auth.user_id()));
    info!(rides = store.ride_history().len(), "ride history loaded");
}
