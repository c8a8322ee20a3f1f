use core::net::{Ipv4Addr, SocketAddrV4};

use embassy_time::Duration;

use crate::retry::RetryPolicy;
use crate::sensors::registers::DEFAULT_ADDRESS;
use crate::sensors::{AccelScaleRange, BusPins, GyroScaleRange};

pub const DEFAULT_SSID: &str = "MPU6050-Server";
pub const DEFAULT_PASSWORD: &str = "sensorpass";

#[derive(Debug, Clone)]
pub struct Config<'a> {
    pub network: NetworkConfig<'a>,
    pub sensor: SensorConfig,
    pub client: ClientConfig,
    /// Heartbeat toggle period in whole seconds, zero to leave it off.
    pub heartbeat_interval_secs: u32,
    pub poll_period: Duration,
    pub retry: RetryPolicy,
}

impl Default for Config<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Config<'_> {
    pub fn new() -> Self {
        Self {
            network: NetworkConfig::default(),
            sensor: SensorConfig::default(),
            client: ClientConfig::default(),
            heartbeat_interval_secs: 1,
            poll_period: Duration::from_millis(100),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NetworkConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
    /// Access point address, also the gateway for the client.
    pub server_ip: Ipv4Addr,
    pub client_ip: Ipv4Addr,
    pub prefix_len: u8,
    pub telemetry_port: u16,
    pub http_port: u16,
    /// Run the telemetry listener next to the HTTP one.
    pub serve_telemetry: bool,
}

impl Default for NetworkConfig<'_> {
    fn default() -> Self {
        Self {
            ssid: DEFAULT_SSID,
            password: DEFAULT_PASSWORD,
            server_ip: Ipv4Addr::new(192, 168, 4, 1),
            client_ip: Ipv4Addr::new(192, 168, 4, 2),
            prefix_len: 24,
            telemetry_port: 4242,
            http_port: 80,
            serve_telemetry: true,
        }
    }
}

impl NetworkConfig<'_> {
    pub fn telemetry_endpoint(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.server_ip, self.telemetry_port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorConfig {
    pub address: u8,
    pub pins: BusPins,
    pub bus_frequency_khz: u32,
    pub accel_range: AccelScaleRange,
    pub gyro_range: GyroScaleRange,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            pins: BusPins { sda: 4, scl: 5 },
            bus_frequency_khz: 400,
            accel_range: AccelScaleRange::G2,
            gyro_range: GyroScaleRange::D250,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    pub request_timeout: Duration,
    /// How long the indicator stays lit after each request.
    pub pulse: Duration,
    /// Pause after the pulse before the next request.
    pub rest: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: crate::net::client::DEFAULT_TIMEOUT,
            pulse: Duration::from_millis(100),
            rest: Duration::from_millis(900),
        }
    }
}
