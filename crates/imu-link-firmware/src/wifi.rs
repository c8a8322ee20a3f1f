//! Wi-Fi bring-up for both boards.
//!
//! The server runs a WPA2 access point, the client joins it as a station.
//! Both sides use static addressing on the same /24.

use core::net::Ipv4Addr;

use embassy_net::{Ipv4Cidr, Runner, StaticConfigV4};
use embassy_time::with_timeout;
use esp_radio::wifi::{
    AccessPointConfig, AuthMethod, ClientConfig as StationConfig, ModeConfig, WifiController,
    WifiDevice,
};
use imu_link_core::app_state::AppError;
use imu_link_core::config::NetworkConfig;
use imu_link_core::retry::RetryPolicy;
use log::{info, warn};

/// Sockets the stack can hold: HTTP and telemetry listeners, or one dialer.
pub const STACK_SOCKETS: usize = 3;

/// Static IPv4 configuration for the link subnet.
pub fn static_ipv4(address: Ipv4Addr, prefix_len: u8, gateway: Ipv4Addr) -> embassy_net::Config {
    embassy_net::Config::ipv4_static(StaticConfigV4 {
        address: Ipv4Cidr::new(address, prefix_len),
        gateway: Some(gateway),
        dns_servers: Default::default(),
    })
}

/// Start a WPA2-Personal access point with the configured credentials.
pub async fn start_access_point(
    controller: &mut WifiController<'static>,
    network: &NetworkConfig<'_>,
) -> Result<(), AppError> {
    let access_point = AccessPointConfig::default()
        .with_ssid(network.ssid.into())
        .with_password(network.password.into())
        .with_auth_method(AuthMethod::Wpa2Personal);

    controller
        .set_config(&ModeConfig::AccessPoint(access_point))
        .map_err(|e| AppError::wifi(format_args!("AP config: {:?}", e)))?;
    controller
        .start_async()
        .await
        .map_err(|e| AppError::wifi(format_args!("AP start: {:?}", e)))?;

    info!("Access point '{}' started", network.ssid);
    Ok(())
}

/// Join the access point as a station, giving up once `policy` is exhausted.
pub async fn join_network(
    controller: &mut WifiController<'static>,
    network: &NetworkConfig<'_>,
    policy: &RetryPolicy,
) -> Result<(), AppError> {
    let station = StationConfig::default()
        .with_ssid(network.ssid.into())
        .with_password(network.password.into());

    controller
        .set_config(&ModeConfig::Client(station))
        .map_err(|e| AppError::wifi(format_args!("station config: {:?}", e)))?;
    controller
        .start_async()
        .await
        .map_err(|e| AppError::wifi(format_args!("station start: {:?}", e)))?;

    let mut retry = policy.start();
    loop {
        let attempt = retry.begin_attempt()?;
        info!(
            "Joining '{}' (attempt {}/{})",
            network.ssid, attempt, policy.max_attempts
        );

        match with_timeout(policy.attempt_timeout, controller.connect_async()).await {
            Ok(Ok(())) => {
                info!("Joined '{}'", network.ssid);
                return Ok(());
            }
            Ok(Err(e)) => warn!("Join failed: {:?}", e),
            Err(_) => warn!(
                "Join timed out after {} s",
                policy.attempt_timeout.as_secs()
            ),
        }

        retry.backoff().await;
    }
}

#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}
