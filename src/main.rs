use serde_json::{json, Map, Value};
use tracing::{error, info, Instrument};

use ride_lifecycle::app_system::{setup_tracing, AppConfig, RideSystem};
use ride_lifecycle::clients::BookingRequest;
use ride_lifecycle::domain::{FixedLocation, LocationProvider, RideSnapshot, RideStatus, Session, VehicleClass};
use ride_lifecycle::fare::FareEstimator;
use ride_lifecycle::mirror::active_ride_path;
use ride_lifecycle::ride_actor::RidePatch;

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = AppConfig::from_env().map_err(|e| e.to_string())?;
    info!(?config, "Starting ride lifecycle demo");

    let system = RideSystem::new(config);
    let session = Session::new("rider_demo", "0501234567");

    let profile = system
        .profiles
        .register_rider(&session, "Demo Rider".to_string())
        .await
        .map_err(|e| e.to_string())?;
    info!(phone = %profile.phone_number, "Rider registered");

    // Booking form
    let class = VehicleClass::Standard;
    let fare = FareEstimator::new().estimate(class);
    let location = FixedLocation::default();
    let request = BookingRequest::new("Tahlia St", "King Fahd Rd", class.tag(), fare, location.pickup_location());

    let span = tracing::info_span!("booking");
    let ride_id = async {
        info!(fare, "Booking ride");
        system.rides.create_ride(&session, request).await
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;

    let mut handle = system
        .rides
        .subscribe(ride_id.clone(), |snapshot: RideSnapshot| {
            info!(
                status = %snapshot.status,
                text = snapshot.status.tracking_text(),
                color = snapshot.status.tracking_color(),
                "Tracking view updated"
            );
        })
        .await
        .map_err(|e| e.to_string())?;

    // Stand in for the matching process, which writes both stores directly.
    let span = tracing::info_span!("matching");
    async {
        let driver = json!({"name": "Saad", "vehicle": "Toyota Camry", "plateNumber": "RUH 4821"});
        for status in [RideStatus::Accepted, RideStatus::Arrived, RideStatus::Started] {
            let mut partial = Map::new();
            partial.insert("status".to_string(), Value::from(status.as_str()));
            if status == RideStatus::Accepted {
                partial.insert("driver".to_string(), driver.clone());
            }
            system
                .mirror
                .update(active_ride_path(&ride_id), partial)
                .await
                .map_err(|e| e.to_string())?;
            system
                .ride_store
                .update(ride_id.clone(), RidePatch::status(status))
                .await
                .map_err(|e| e.to_string())?;
        }
        Ok::<(), String>(())
    }
    .instrument(span)
    .await?;

    if let Err(e) = system.rides.cancel(&session, ride_id.clone()).await {
        info!(error = %e, message = e.user_message(), "Cancel refused as expected");
    }

    match system.rides.complete(&session, ride_id.clone()).await {
        Ok(ride) => info!(ride_id = %ride.id, completed_at = ?ride.completed_at, "Ride completed"),
        Err(e) => error!(error = %e, "Completing ride failed"),
    }

    handle.unsubscribe().await.map_err(|e| e.to_string())?;

    let history = system
        .rides
        .list_history(&session, system.config.history_limit)
        .await
        .map_err(|e| e.to_string())?;
    for ride in &history {
        info!(
            ride_id = %ride.id,
            route = %format!("{} -> {}", ride.pickup, ride.destination),
            vehicle = ride.vehicle_type.display_name(),
            fare = ride.estimated_fare,
            status = %ride.status,
            color = ride.status.history_color(),
            "History entry"
        );
    }

    let report = system.reconciler.reconcile_once().await.map_err(|e| e.to_string())?;
    info!(clean = report.is_clean(), "Stores checked");

    system.shutdown().await?;

    info!("Demo completed successfully");
    Ok(())
}
