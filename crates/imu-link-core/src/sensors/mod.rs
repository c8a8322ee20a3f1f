//! Sensor trait definitions, the shared reading type and the MPU6050 driver.

#[cfg(any(test, feature = "mock-bus"))]
pub mod mock_bus;
pub mod mpu6050;
mod ranges;
pub mod registers;

pub use mpu6050::{BURST_LEN, Mpu6050, decode_burst};
pub use ranges::{AccelScaleRange, GyroScaleRange};

use thiserror_no_std::Error;

/// Number of values carried by a [`SensorReading`].
pub const READING_FIELDS: usize = 7;

/// One complete IMU sample in physical units.
///
/// Produced whole by a successful driver read and never partially updated.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorReading {
    /// Acceleration in g
    pub accel_x: f32,
    pub accel_y: f32,
    pub accel_z: f32,
    /// Die temperature in °C
    pub temperature: f32,
    /// Angular rate in °/s
    pub gyro_x: f32,
    pub gyro_y: f32,
    pub gyro_z: f32,
}

impl SensorReading {
    /// All fields zero; what a store holds before the first successful read.
    pub const ZERO: Self = Self::from_wire_array([0.0; READING_FIELDS]);

    /// Values in the order they travel on the telemetry wire:
    /// accel x/y/z, gyro x/y/z, temperature.
    pub const fn to_wire_array(&self) -> [f32; READING_FIELDS] {
        [
            self.accel_x,
            self.accel_y,
            self.accel_z,
            self.gyro_x,
            self.gyro_y,
            self.gyro_z,
            self.temperature,
        ]
    }

    /// Inverse of [`SensorReading::to_wire_array`].
    pub const fn from_wire_array(values: [f32; READING_FIELDS]) -> Self {
        Self {
            accel_x: values[0],
            accel_y: values[1],
            accel_z: values[2],
            gyro_x: values[3],
            gyro_y: values[4],
            gyro_z: values[5],
            temperature: values[6],
        }
    }
}

/// I2C pin assignment of a sensor bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusPins {
    pub sda: u8,
    pub scl: u8,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor} initialization failed: {details}")]
    InitializationFailed {
        sensor: &'static str,
        details: &'static str,
    },
    #[error("{sensor} identity mismatch: expected 0x{expected:02X}, found 0x{found:02X}")]
    IdentityMismatch {
        sensor: &'static str,
        expected: u8,
        found: u8,
    },
    #[error("{sensor} read failed during {operation}: {details}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: &'static str,
    },
    #[error("{sensor} used before a successful initialization")]
    NotInitialized { sensor: &'static str },
    #[error("range code {code} is outside 0..=3")]
    InvalidRange { code: u8 },
}

/// Trait for sensors that produce typed readings.
pub trait Sensor {
    /// The type of readings this sensor produces.
    type Readings;

    /// Read the sensor and return typed readings.
    fn read(&mut self) -> impl Future<Output = Result<Self::Readings, SensorError>>;
}
