//! Hardware initialization for the imu-link boards
//!
//! Both boards use GPIO2 for the indicator LED; the server additionally drives
//! the MPU6050 on I2C0 with SDA on GPIO4 and SCL on GPIO5.

use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::i2c::master::{Config as I2cConfig, ConfigError, I2c};
use esp_hal::time::Rate;
use log::info;

/// Initialize the I2C bus hardware
///
/// Creates the I2C peripheral at the configured frequency. The pin drivers
/// enable the internal pull-ups on SDA and SCL.
pub fn create_i2c_bus(
    i2c0: esp_hal::peripherals::I2C0<'static>,
    sda: esp_hal::peripherals::GPIO4<'static>,
    scl: esp_hal::peripherals::GPIO5<'static>,
    frequency_khz: u32,
) -> Result<I2c<'static, esp_hal::Async>, ConfigError> {
    let bus = I2c::new(
        i2c0,
        I2cConfig::default().with_frequency(Rate::from_khz(frequency_khz)),
    )?
    .with_sda(sda)
    .with_scl(scl)
    .into_async();

    info!("I2C0 ready at {} kHz (sda GPIO4, scl GPIO5)", frequency_khz);
    Ok(bus)
}

/// Indicator LED, off at boot
pub fn create_indicator(pin: esp_hal::peripherals::GPIO2<'static>) -> Output<'static> {
    Output::new(pin, Level::Low, OutputConfig::default())
}
