//! Book one ride between two demo locations and print the session timeline.
//!
//! Run with: RUST_LOG=ride_core=debug cargo run -p ride_core --example ride_run

use ride_core::config::RideConfig;
use ride_core::ride::TrackingStatus;
use ride_core::store::Completion;
use ride_core::telemetry::StatusChange;
use ride_core::test_helpers::planned_session;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ride_core=info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match RideConfig::from_path(&path) {
            Ok(config) => config,
            Err(error) => {
                eprintln!("failed to load config from {path}: {error}");
                std::process::exit(1);
            }
        },
        None => RideConfig::default().with_seed(123),
    };

    let mut session = planned_session(config);
    println!(
        "--- Demo ride (seed {}) ---\nEstimated fare: {:.2}",
        config.seed,
        session.rides().estimated_fare()
    );

    if let Err(error) = session.request_booking() {
        eprintln!("booking failed: {error}");
        std::process::exit(1);
    }

    let mut steps = 0;
    while session.tracking().status() != TrackingStatus::InProgress && steps < 600 {
        session.advance_by(1_000);
        steps += 1;
    }

    for transition in &session.telemetry().transitions {
        let label = match transition.change {
            StatusChange::Ride(status) => format!("ride     {status:?}"),
            StatusChange::Tracking(status) => format!("tracking {status:?}"),
        };
        println!("{:>8.1} s  {label}", transition.timestamp_ms as f64 / 1000.0);
    }
    if let Some(sample) = session.telemetry().last_sample() {
        println!(
            "Last sample: {:.3} km away, {:.1} km/h, eta {} min",
            sample.distance_km, sample.speed_kmh, sample.eta_min
        );
    }

    match session.complete_ride(Completion::new(5).with_tip(20.0)) {
        Ok(receipt) => println!(
            "Paid {:.2} (fare {:.2} + tip {:.2}); loyalty balance {}",
            receipt.total, receipt.per_person_fare, receipt.tip, receipt.loyalty_points
        ),
        Err(error) => eprintln!("completion failed: {error}"),
    }
    for notification in session.notifications().notifications().iter().rev() {
        println!("[{}] {}", notification.title, notification.message);
    }
}
