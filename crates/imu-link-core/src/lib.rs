//! Hardware-independent core library for imu-link
//!
//! This crate contains all platform-agnostic logic of the MPU6050 telemetry
//! pair: the sensor driver, the latest-reading store and its wire codec, the
//! server and client protocol handlers, the heartbeat indicator, the Wi-Fi
//! retry policy, run state and configuration.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32-S3) and desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod app_state;
pub mod config;
pub mod heartbeat;
pub mod net;
pub mod retry;
pub mod sensors;
pub mod telemetry;

#[cfg(test)]
mod test_support;
