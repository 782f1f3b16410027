//! Client state containers, each an ECS resource owned by the session world.

pub mod auth_store;
pub mod notifications;
pub mod ride_store;

pub use auth_store::{AuthStore, PersistedAuth, User, UserPatch};
pub use notifications::{NotificationKind, NotificationStore, RideNotification};
pub use ride_store::{Completion, PendingBooking, RideStore};
