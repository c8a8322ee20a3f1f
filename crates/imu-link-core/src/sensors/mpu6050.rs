//! Register-level MPU6050 driver
//!
//! Talks to the device through any `embedded_hal_async::i2c::I2c` bus. The
//! handle owns the bus exclusively; scale factors are fixed when the handle is
//! created and only change by building a new handle.

use embedded_hal_async::i2c::I2c;
use log::{error, info};

use super::registers::{
    ACCEL_CONFIG, ACCEL_XOUT_H, EXPECTED_IDENTITY, GYRO_CONFIG, PWR_MGMT_1, TEMP_OFFSET_C,
    TEMP_SENSITIVITY, WAKE, WHO_AM_I,
};
use super::{AccelScaleRange, BusPins, GyroScaleRange, Sensor, SensorError, SensorReading};
use crate::config::SensorConfig;

const SENSOR: &str = "MPU6050";

/// Length of the accel/temp/gyro block starting at `ACCEL_XOUT_H`.
pub const BURST_LEN: usize = 14;

pub struct Mpu6050<I> {
    i2c: I,
    address: u8,
    pins: BusPins,
    accel_range: AccelScaleRange,
    gyro_range: GyroScaleRange,
    accel_scale: f32,
    gyro_scale: f32,
    initialized: bool,
}

impl<I: I2c> Mpu6050<I> {
    /// Bind a handle to the bus. Nothing is sent until [`Mpu6050::init`].
    pub fn new(i2c: I, config: &SensorConfig) -> Self {
        Self {
            i2c,
            address: config.address,
            pins: config.pins,
            accel_range: config.accel_range,
            gyro_range: config.gyro_range,
            accel_scale: config.accel_range.as_scale_factor(),
            gyro_scale: config.gyro_range.as_scale_factor(),
            initialized: false,
        }
    }

    /// Verify the device identity, then wake it and program both ranges.
    ///
    /// A mismatching identity aborts before any configuration register is
    /// written. On any failure the handle stays unusable until `init`
    /// succeeds.
    pub async fn init(&mut self) -> Result<(), SensorError> {
        self.initialized = false;

        let identity = self.read_register(WHO_AM_I).await.map_err(|e| {
            error!("MPU6050 identity read failed: {:?}", e);
            SensorError::InitializationFailed {
                sensor: SENSOR,
                details: "Failed to read identity register",
            }
        })?;

        if identity != EXPECTED_IDENTITY {
            error!(
                "MPU6050 at 0x{:02X} reported identity 0x{:02X}",
                self.address, identity
            );
            return Err(SensorError::IdentityMismatch {
                sensor: SENSOR,
                expected: EXPECTED_IDENTITY,
                found: identity,
            });
        }

        let config = [
            (PWR_MGMT_1, WAKE, "Failed to wake device"),
            (
                ACCEL_CONFIG,
                self.accel_range.as_register(),
                "Failed to set accelerometer range",
            ),
            (
                GYRO_CONFIG,
                self.gyro_range.as_register(),
                "Failed to set gyroscope range",
            ),
        ];
        for (register, value, details) in config {
            self.write_register(register, value).await.map_err(|e| {
                error!("MPU6050 write to 0x{:02X} failed: {:?}", register, e);
                SensorError::InitializationFailed {
                    sensor: SENSOR,
                    details,
                }
            })?;
        }

        self.initialized = true;
        info!(
            "MPU6050 ready at 0x{:02X} (sda {}, scl {}, accel {:?}, gyro {:?})",
            self.address, self.pins.sda, self.pins.scl, self.accel_range, self.gyro_range
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn pins(&self) -> BusPins {
        self.pins
    }

    /// Sensitivity in LSB/g selected for this handle.
    pub fn accel_scale(&self) -> f32 {
        self.accel_scale
    }

    /// Sensitivity in LSB/(°/s) selected for this handle.
    pub fn gyro_scale(&self) -> f32 {
        self.gyro_scale
    }

    /// Give the bus back, e.g. to build a handle with different ranges.
    pub fn release(self) -> I {
        self.i2c
    }

    async fn read_register(&mut self, register: u8) -> Result<u8, I::Error> {
        let mut value = [0u8; 1];
        self.i2c
            .write_read(self.address, &[register], &mut value)
            .await?;
        Ok(value[0])
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), I::Error> {
        self.i2c.write(self.address, &[register, value]).await
    }
}

impl<I: I2c> Sensor for Mpu6050<I> {
    type Readings = SensorReading;

    /// Burst-read the 14 data registers in one combined transaction.
    async fn read(&mut self) -> Result<SensorReading, SensorError> {
        if !self.initialized {
            return Err(SensorError::NotInitialized { sensor: SENSOR });
        }

        let mut raw = [0u8; BURST_LEN];
        self.i2c
            .write_read(self.address, &[ACCEL_XOUT_H], &mut raw)
            .await
            .map_err(|e| {
                error!("MPU6050 burst read failed: {:?}", e);
                SensorError::ReadFailed {
                    sensor: SENSOR,
                    operation: "burst read of data registers",
                    details: "I2C communication error",
                }
            })?;

        Ok(decode_burst(&raw, self.accel_scale, self.gyro_scale))
    }
}

/// Convert the raw burst block into physical units.
///
/// The block holds seven big-endian two's-complement words: accel x/y/z,
/// temperature, gyro x/y/z.
pub fn decode_burst(raw: &[u8; BURST_LEN], accel_scale: f32, gyro_scale: f32) -> SensorReading {
    let word = |index: usize| i16::from_be_bytes([raw[index * 2], raw[index * 2 + 1]]) as f32;

    SensorReading {
        accel_x: word(0) / accel_scale,
        accel_y: word(1) / accel_scale,
        accel_z: word(2) / accel_scale,
        temperature: word(3) / TEMP_SENSITIVITY + TEMP_OFFSET_C,
        gyro_x: word(4) / gyro_scale,
        gyro_y: word(5) / gyro_scale,
        gyro_z: word(6) / gyro_scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::mock_bus::MockMpu6050;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn config(accel: AccelScaleRange, gyro: GyroScaleRange) -> SensorConfig {
        SensorConfig {
            accel_range: accel,
            gyro_range: gyro,
            ..SensorConfig::default()
        }
    }

    #[test]
    fn test_decode_all_zero_burst() {
        let reading = decode_burst(&[0; BURST_LEN], 16384.0, 131.0);

        assert_eq!(reading.accel_x, 0.0);
        assert_eq!(reading.accel_y, 0.0);
        assert_eq!(reading.accel_z, 0.0);
        assert!(close(reading.temperature, 36.53));
        assert_eq!(reading.gyro_x, 0.0);
        assert_eq!(reading.gyro_y, 0.0);
        assert_eq!(reading.gyro_z, 0.0);
    }

    #[test]
    fn test_decode_known_counts() {
        // 16384, -8192, 4096, -340, 131, -262, 1310
        let raw = [
            0x40, 0x00, 0xE0, 0x00, 0x10, 0x00, 0xFE, 0xAC, 0x00, 0x83, 0xFE, 0xFA, 0x05, 0x1E,
        ];
        let reading = decode_burst(&raw, 16384.0, 131.0);

        assert!(close(reading.accel_x, 1.0));
        assert!(close(reading.accel_y, -0.5));
        assert!(close(reading.accel_z, 0.25));
        assert!(close(reading.temperature, 35.53));
        assert!(close(reading.gyro_x, 1.0));
        assert!(close(reading.gyro_y, -2.0));
        assert!(close(reading.gyro_z, 10.0));
    }

    #[test]
    fn test_handle_takes_scale_from_ranges() {
        let scales = [
            (AccelScaleRange::G2, GyroScaleRange::D250, 16384.0, 131.0),
            (AccelScaleRange::G4, GyroScaleRange::D500, 8192.0, 65.5),
            (AccelScaleRange::G8, GyroScaleRange::D1000, 4096.0, 32.8),
            (AccelScaleRange::G16, GyroScaleRange::D2000, 2048.0, 16.4),
        ];

        for (accel, gyro, accel_scale, gyro_scale) in scales {
            let imu = Mpu6050::new(MockMpu6050::new(), &config(accel, gyro));
            assert_eq!(imu.accel_scale(), accel_scale);
            assert_eq!(imu.gyro_scale(), gyro_scale);
        }
    }

    #[tokio::test]
    async fn test_init_writes_configuration_in_order() {
        let mut imu = Mpu6050::new(
            MockMpu6050::new(),
            &config(AccelScaleRange::G8, GyroScaleRange::D1000),
        );

        imu.init().await.unwrap();
        assert!(imu.is_initialized());

        let bus = imu.release();
        assert_eq!(
            bus.writes(),
            &[(PWR_MGMT_1, 0x00), (ACCEL_CONFIG, 0x10), (GYRO_CONFIG, 0x10)]
        );
    }

    #[tokio::test]
    async fn test_identity_mismatch_aborts_before_configuration() {
        let mut imu = Mpu6050::new(
            MockMpu6050::new().with_identity(0x70),
            &SensorConfig::default(),
        );

        let result = imu.init().await;

        assert_eq!(
            result,
            Err(SensorError::IdentityMismatch {
                sensor: "MPU6050",
                expected: 0x68,
                found: 0x70,
            })
        );
        assert!(!imu.is_initialized());
        assert!(imu.release().writes().is_empty());
    }

    #[tokio::test]
    async fn test_missing_device_fails_init() {
        let mut imu = Mpu6050::new(
            MockMpu6050::new().with_address(0x69),
            &SensorConfig::default(),
        );

        assert!(matches!(
            imu.init().await,
            Err(SensorError::InitializationFailed { .. })
        ));
        assert!(matches!(
            imu.read().await,
            Err(SensorError::NotInitialized { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_scales_burst() {
        let mut bus = MockMpu6050::new();
        bus.set_raw_sample([8192, 0, -8192, 0, 655, 0, -655]);
        let mut imu = Mpu6050::new(bus, &config(AccelScaleRange::G4, GyroScaleRange::D500));
        imu.init().await.unwrap();

        let reading = imu.read().await.unwrap();

        assert!(close(reading.accel_x, 1.0));
        assert!(close(reading.accel_z, -1.0));
        assert!(close(reading.temperature, 36.53));
        assert!(close(reading.gyro_x, 10.0));
        assert!(close(reading.gyro_z, -10.0));
    }

    #[tokio::test]
    async fn test_failed_burst_returns_no_reading() {
        let mut imu = Mpu6050::new(MockMpu6050::new(), &SensorConfig::default());
        imu.init().await.unwrap();

        let mut bus = imu.release();
        bus.set_fail_reads(true);
        let mut imu = Mpu6050::new(bus, &SensorConfig::default());
        imu.initialized = true;

        assert!(matches!(
            imu.read().await,
            Err(SensorError::ReadFailed { .. })
        ));
    }
}
