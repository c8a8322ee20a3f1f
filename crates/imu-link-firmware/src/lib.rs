//! ESP32-S3 firmware-specific modules for imu-link
//!
//! This crate contains hardware-specific code that cannot compile on desktop
//! targets: ESP32 peripheral initialization, Wi-Fi bring-up, embassy-net
//! socket adapters and build-time credential management.

#![no_std]

extern crate alloc;

pub mod app_state;
pub mod net;
pub mod wifi;
pub mod wifi_secrets;
