//! MPU6050 register map (the subset this firmware touches).

/// Default 7-bit bus address (AD0 low).
pub const DEFAULT_ADDRESS: u8 = 0x68;

/// Value the identity register reports on a genuine part.
pub const EXPECTED_IDENTITY: u8 = 0x68;

pub const GYRO_CONFIG: u8 = 0x1B; //[4:3] FS_SEL
pub const ACCEL_CONFIG: u8 = 0x1C; //[4:3] AFS_SEL

pub const ACCEL_XOUT_H: u8 = 0x3B; // start of the 14-byte burst block

pub const PWR_MGMT_1: u8 = 0x6B;
pub const WHO_AM_I: u8 = 0x75;

/// `PWR_MGMT_1` value that clears SLEEP and selects the internal oscillator.
pub const WAKE: u8 = 0x00;

/// Temperature sensor calibration from the register map datasheet.
pub const TEMP_SENSITIVITY: f32 = 340.0;
pub const TEMP_OFFSET_C: f32 = 36.53;
