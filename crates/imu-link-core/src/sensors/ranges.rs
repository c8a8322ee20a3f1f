use super::SensorError;

/// Accelerometer full-scale range, indexed by the 2-bit `AFS_SEL` code.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccelScaleRange {
    #[default]
    G2 = 0,
    G4 = 1,
    G8 = 2,
    G16 = 3,
}

impl AccelScaleRange {
    /// Converts the given full scale range setting into the bits one would need to write into the
    /// `ACCEL_CONFIG` register to configure the sensor to use that scale range.
    pub const fn as_register(self) -> u8 {
        (self as u8) << 3
    }

    /// Sensitivity in LSB/g.
    pub const fn as_scale_factor(self) -> f32 {
        match self {
            Self::G2 => 16384.0,
            Self::G4 => 8192.0,
            Self::G8 => 4096.0,
            Self::G16 => 2048.0,
        }
    }
}

impl TryFrom<u8> for AccelScaleRange {
    type Error = SensorError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::G2),
            1 => Ok(Self::G4),
            2 => Ok(Self::G8),
            3 => Ok(Self::G16),
            _ => Err(SensorError::InvalidRange { code }),
        }
    }
}

/// Gyroscope full-scale range, indexed by the 2-bit `FS_SEL` code.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GyroScaleRange {
    #[default]
    D250 = 0,
    D500 = 1,
    D1000 = 2,
    D2000 = 3,
}

impl GyroScaleRange {
    /// Converts the given full scale range setting into the bits one would need to write into the
    /// `GYRO_CONFIG` register to configure the sensor to use that scale range.
    pub const fn as_register(self) -> u8 {
        (self as u8) << 3
    }

    /// Sensitivity in LSB/(°/s).
    pub const fn as_scale_factor(self) -> f32 {
        match self {
            Self::D250 => 131.0,
            Self::D500 => 65.5,
            Self::D1000 => 32.8,
            Self::D2000 => 16.4,
        }
    }
}

impl TryFrom<u8> for GyroScaleRange {
    type Error = SensorError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::D250),
            1 => Ok(Self::D500),
            2 => Ok(Self::D1000),
            3 => Ok(Self::D2000),
            _ => Err(SensorError::InvalidRange { code }),
        }
    }
}
