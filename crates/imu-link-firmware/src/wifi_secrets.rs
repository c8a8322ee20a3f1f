//! Wi-Fi credentials, fixed at build time.
//!
//! `build.rs` forwards `IMU_LINK_SSID` and `IMU_LINK_PASSWORD` from `.env`;
//! without them the link uses the stock credentials.

use imu_link_core::config::{DEFAULT_PASSWORD, DEFAULT_SSID};

pub const SSID: &str = match option_env!("IMU_LINK_SSID") {
    Some(ssid) => ssid,
    None => DEFAULT_SSID,
};

pub const PASSWORD: &str = match option_env!("IMU_LINK_PASSWORD") {
    Some(password) => password,
    None => DEFAULT_PASSWORD,
};
