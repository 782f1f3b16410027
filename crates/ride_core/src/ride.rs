//! Ride records, lifecycle states and the simulated driver roster.

use serde::{Deserialize, Serialize};

use crate::geo::Location;
use crate::pricing::RideType;

/// Coarse lifecycle of a booked ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RideStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

/// Finer-grained status shown while the driver approaches and carries the rider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackingStatus {
    #[default]
    Arriving,
    Arrived,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    pub id: String,
    pub user_id: String,
    pub driver_id: Option<String>,
    pub driver_name: Option<String>,
    pub driver_rating: Option<f64>,
    pub pickup: Location,
    pub destination: Location,
    pub ride_type: RideType,
    pub fare: f64,
    pub shared_ride: bool,
    /// Number of co-riders splitting the fare; only set for shared rides.
    pub split_count: Option<u8>,
    pub status: RideStatus,
    /// Wall-clock milliseconds.
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub rating: Option<u8>,
    pub feedback: Option<String>,
    /// Code the rider reads out to the driver at pickup.
    pub otp: Option<u16>,
}

impl Ride {
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            RideStatus::Pending | RideStatus::Confirmed | RideStatus::InProgress
        )
    }

    pub fn assign_driver(&mut self, driver: &DriverProfile) {
        self.driver_id = Some(driver.id.to_string());
        self.driver_name = Some(driver.name.to_string());
        self.driver_rating = Some(driver.rating);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriverProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub rating: f64,
    pub trips: u32,
    pub car_model: &'static str,
    pub car_number: &'static str,
    pub car_color: &'static str,
}

/// Drivers the search step picks from.
pub const DRIVER_ROSTER: [DriverProfile; 3] = [
    DriverProfile {
        id: "driver-1",
        name: "Rajesh Kumar",
        rating: 4.9,
        trips: 1250,
        car_model: "Maruti Suzuki Swift Dzire",
        car_number: "DL 01 AB 1234",
        car_color: "White",
    },
    DriverProfile {
        id: "driver-2",
        name: "Priya Sharma",
        rating: 4.8,
        trips: 890,
        car_model: "Honda City",
        car_number: "MH 02 CD 5678",
        car_color: "Black",
    },
    DriverProfile {
        id: "driver-3",
        name: "Amit Patel",
        rating: 4.7,
        trips: 2100,
        car_model: "Hyundai Verna",
        car_number: "KA 03 EF 9012",
        car_color: "Silver",
    },
];

pub fn find_driver(id: &str) -> Option<&'static DriverProfile> {
    DRIVER_ROSTER.iter().find(|driver| driver.id == id)
}

/// Two completed trips served by the history screen.
pub fn demo_ride_history(user_id: &str) -> Vec<Ride> {
    vec![
        Ride {
            id: "ride-1".to_string(),
            user_id: user_id.to_string(),
            driver_id: Some("driver-1".to_string()),
            driver_name: Some("Rajesh Kumar".to_string()),
            driver_rating: Some(4.9),
            pickup: Location {
                lat: 28.6139,
                lng: 77.209,
                address: "Connaught Place, New Delhi".to_string(),
            },
            destination: Location {
                lat: 28.5535,
                lng: 77.2588,
                address: "Nehru Place, New Delhi".to_string(),
            },
            ride_type: RideType::Premium,
            fare: 450.0,
            shared_ride: false,
            split_count: None,
            status: RideStatus::Completed,
            created_at: 1_770_978_600_000,
            completed_at: Some(1_770_980_400_000),
            rating: Some(5),
            feedback: None,
            otp: None,
        },
        Ride {
            id: "ride-2".to_string(),
            user_id: user_id.to_string(),
            driver_id: Some("driver-2".to_string()),
            driver_name: Some("Priya Sharma".to_string()),
            driver_rating: Some(4.7),
            pickup: Location {
                lat: 28.5562,
                lng: 77.1,
                address: "IGI Airport Terminal 3, Delhi".to_string(),
            },
            destination: Location {
                lat: 28.6304,
                lng: 77.2177,
                address: "India Gate, New Delhi".to_string(),
            },
            ride_type: RideType::Economy,
            fare: 650.0,
            shared_ride: false,
            split_count: None,
            status: RideStatus::Completed,
            created_at: 1_770_732_000_000,
            completed_at: Some(1_770_737_400_000),
            rating: Some(4),
            feedback: None,
            otp: None,
        },
    ]
}
