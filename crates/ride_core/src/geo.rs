//! Geographic primitives: points, labelled locations and distance helpers.
//!
//! Two distance measures live here on purpose:
//!
//! - **Planar proxy**: `sqrt(Δlat² + Δlng²) × km_per_degree`, used by fare
//!   estimation. Only meaningful for close-together points.
//! - **Haversine**: great-circle distance on a 6371 km sphere, used by the
//!   tracking simulator.

use h3o::{CellIndex, LatLng, Resolution};
use serde::{Deserialize, Serialize};

use crate::error::RideError;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree used by the planar distance proxy.
pub const KM_PER_DEGREE: f64 = 111.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Validated constructor: coordinates must be finite and within range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, RideError> {
        let in_range = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng);
        if !in_range || LatLng::new(lat, lng).is_err() {
            return Err(RideError::InvalidCoordinate { lat, lng });
        }
        Ok(Self { lat, lng })
    }

    pub fn offset(self, dlat: f64, dlng: f64) -> Self {
        Self {
            lat: self.lat + dlat,
            lng: self.lng + dlng,
        }
    }

    /// Moves `fraction` of the remaining lat/lng delta toward `target`.
    pub fn step_toward(self, target: GeoPoint, fraction: f64) -> Self {
        Self {
            lat: self.lat + (target.lat - self.lat) * fraction,
            lng: self.lng + (target.lng - self.lng) * fraction,
        }
    }

    /// H3 cell (resolution 9) containing this point, if the coordinates are valid.
    pub fn cell(self) -> Option<CellIndex> {
        LatLng::new(self.lat, self.lng)
            .ok()
            .map(|lat_lng| lat_lng.to_cell(Resolution::Nine))
    }
}

/// A point the rider picked, with its display address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

impl Location {
    pub fn new(lat: f64, lng: f64, address: impl Into<String>) -> Result<Self, RideError> {
        let point = GeoPoint::new(lat, lng)?;
        Ok(Self::at(point, address))
    }

    pub fn at(point: GeoPoint, address: impl Into<String>) -> Self {
        Self {
            lat: point.lat,
            lng: point.lng,
            address: address.into(),
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lng.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lng.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Euclidean distance in degrees scaled to approximate kilometres.
pub fn planar_distance_km(a: GeoPoint, b: GeoPoint, km_per_degree: f64) -> f64 {
    let dlat = b.lat - a.lat;
    let dlng = b.lng - a.lng;
    (dlat * dlat + dlng * dlng).sqrt() * km_per_degree
}
