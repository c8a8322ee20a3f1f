//! Desktop simulator for the imu-link telemetry pair.
//!
//! Runs the server side (simulated MPU6050, acquisition loop, telemetry and
//! HTTP listeners, heartbeat) and the client request loop in one process,
//! talking over loopback TCP. The HTTP page is served on a non-privileged
//! port, so a browser can also be pointed at it.

mod net;

use std::convert::Infallible;
use std::net::Ipv4Addr;

use clap::Parser;
use embassy_futures::select::{select, select4};
use embassy_time::Timer;
use embedded_hal::digital::{ErrorType, OutputPin};
use log::{debug, error, info, warn};

use imu_link_core::config::{ClientConfig, Config, NetworkConfig};
use imu_link_core::heartbeat::Heartbeat;
use imu_link_core::net::{ClientReading, Dialer, TelemetryClient, serve_http, serve_telemetry};
use imu_link_core::sensors::Mpu6050;
use imu_link_core::sensors::mock_bus::MockMpu6050;
use imu_link_core::telemetry::{TelemetryStore, run_acquisition};

use crate::net::{TokioDialer, TokioListener};

/// Run the imu-link server and client against each other on localhost.
#[derive(Parser)]
struct Cli {
    /// Telemetry listener port
    #[arg(long, default_value_t = 4242)]
    telemetry_port: u16,

    /// HTTP welcome page port
    #[arg(long, default_value_t = 8080)]
    http_port: u16,

    /// Heartbeat period in seconds, 0 to disable
    #[arg(long, default_value_t = 1)]
    heartbeat_secs: u32,

    /// Stop after this many client requests, 0 to run forever
    #[arg(long, default_value_t = 0)]
    requests: u32,

    /// Only run the HTTP listener, like a server built without telemetry
    #[arg(long)]
    http_only: bool,
}

/// Raw counts for a board rocking slowly about its X axis at 25 °C.
fn rocking_board(burst: u32) -> [i16; 7] {
    let t = burst as f32 * 0.1;
    let tilt = 0.25 * t.sin();

    [
        (tilt.sin() * 16384.0) as i16,
        (0.05 * (3.0 * t).cos() * 16384.0) as i16,
        (tilt.cos() * 16384.0) as i16,
        ((25.0 - 36.53) * 340.0) as i16,
        ((0.25 * t.cos()).to_degrees() * 131.0) as i16,
        0,
        (-1.5 * 131.0) as i16,
    ]
}

/// Heartbeat indicator that only logs its level.
struct LogPin;

impl ErrorType for LogPin {
    type Error = Infallible;
}

impl OutputPin for LogPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        debug!("Heartbeat off");
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        debug!("Heartbeat on");
        Ok(())
    }
}

async fn client_loop<D: Dialer>(
    client: &mut TelemetryClient<D>,
    timing: &ClientConfig,
    requests: u32,
) {
    let mut reading = ClientReading::default();
    let mut sent = 0;

    while requests == 0 || sent < requests {
        sent += 1;
        if let Err(e) = client.request_reading(&mut reading).await {
            warn!("Request to {} failed: {}", client.endpoint(), e);
        }

        info!(
            "Accel: X={:.2}g Y={:.2}g Z={:.2}g Temp={:.1}°C",
            reading.accel_x, reading.accel_y, reading.accel_z, reading.temperature
        );

        Timer::after(timing.pulse + timing.rest).await;
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = Config {
        network: NetworkConfig {
            server_ip: Ipv4Addr::LOCALHOST,
            client_ip: Ipv4Addr::LOCALHOST,
            telemetry_port: cli.telemetry_port,
            http_port: cli.http_port,
            serve_telemetry: !cli.http_only,
            ..NetworkConfig::default()
        },
        heartbeat_interval_secs: cli.heartbeat_secs,
        ..Config::new()
    };
    let network = &config.network;

    let store = TelemetryStore::new();
    let heartbeat = Heartbeat::new();

    let mut imu = Mpu6050::new(MockMpu6050::new().with_source(rocking_board), &config.sensor);
    if let Err(e) = imu.init().await {
        error!("Simulated sensor failed to initialize: {}", e);
        return;
    }

    let http_address = std::net::SocketAddrV4::new(network.server_ip, network.http_port);
    let mut http = match TokioListener::bind(http_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Cannot bind HTTP listener on {}: {}", http_address, e);
            return;
        }
    };
    let mut telemetry = match TokioListener::bind(network.telemetry_endpoint()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(
                "Cannot bind telemetry listener on {}: {}",
                network.telemetry_endpoint(),
                e
            );
            return;
        }
    };
    info!(
        "Serving telemetry on {} and HTTP on {}",
        network.telemetry_endpoint(),
        http_address
    );

    heartbeat.init(config.heartbeat_interval_secs);
    let mut indicator = LogPin;

    let mut client = TelemetryClient::new(TokioDialer, network.telemetry_endpoint())
        .with_timeout(config.client.request_timeout);

    let telemetry_server = async {
        if network.serve_telemetry {
            serve_telemetry(&mut telemetry, &store).await
        } else {
            std::future::pending::<()>().await
        }
    };

    select(
        select4(
            serve_http(&mut http),
            telemetry_server,
            run_acquisition(&mut imu, &store, config.poll_period),
            heartbeat.run(&mut indicator),
        ),
        client_loop(&mut client, &config.client, cli.requests),
    )
    .await;

    info!("Client finished, shutting down");
}
