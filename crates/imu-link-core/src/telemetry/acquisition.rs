//! Fixed-period sampling of the IMU into the telemetry store.

use embassy_time::{Duration, Timer};
use log::{debug, warn};

use super::TelemetryStore;
use crate::sensors::{Sensor, SensorError, SensorReading};

/// Take one sample and publish it.
///
/// A failed read leaves the store holding the previous reading.
pub async fn poll_once<S>(
    sensor: &mut S,
    store: &TelemetryStore,
) -> Result<SensorReading, SensorError>
where
    S: Sensor<Readings = SensorReading>,
{
    let reading = sensor.read().await?;
    store.set(reading);
    Ok(reading)
}

pub async fn run_acquisition<S>(sensor: &mut S, store: &TelemetryStore, period: Duration) -> !
where
    S: Sensor<Readings = SensorReading>,
{
    loop {
        match poll_once(sensor, store).await {
            Ok(reading) => debug!(
                "Accel X={:.2}g Y={:.2}g Z={:.2}g",
                reading.accel_x, reading.accel_y, reading.accel_z
            ),
            Err(e) => warn!("Sensor read failed, keeping last reading: {}", e),
        }

        Timer::after(period).await;
    }
}
