//! Error types for ride operations, persisted state, configuration and auth.

use thiserror::Error;

/// Errors returned by ride-store and session operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RideError {
    #[error("cannot book a ride without a pickup location")]
    MissingPickup,
    #[error("cannot book a ride without a destination")]
    MissingDestination,
    #[error("a booking is already in progress")]
    BookingInProgress,
    #[error("there is no current ride")]
    NoCurrentRide,
    #[error("rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),
    #[error("tip must be a non-negative amount, got {0}")]
    InvalidTip(f64),
    #[error("invalid coordinate lat={lat} lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },
}

/// Errors raised while reading or writing persisted client state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    InvalidFormat(String),
}

/// Why the device position could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("geolocation is unavailable on this device")]
    Unavailable,
    #[error("timed out waiting for a position fix")]
    Timeout,
}

/// Errors raised while loading a [`crate::config::RideConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors returned by the auth store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("email is required")]
    MissingEmail,
    #[error("password is required")]
    MissingPassword,
    #[error("name is required")]
    MissingName,
    #[error("an auth request is already in flight")]
    RequestInFlight,
}
