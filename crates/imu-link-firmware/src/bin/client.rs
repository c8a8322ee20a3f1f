#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use core::cell::RefCell;

use embassy_executor::Spawner;
use embassy_net::StackResources;
use embassy_time::Timer;
use esp_hal::clock::CpuClock;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use imu_link_core::config::{Config, NetworkConfig};
use imu_link_core::net::{ClientReading, TelemetryClient};
use imu_link_firmware::app_state::{
    self, AppRunState, AppState, SharedAppState, create_indicator,
};
use imu_link_firmware::net::TcpDialer;
use imu_link_firmware::wifi::{STACK_SOCKETS, join_network, net_task, static_ipv4};
use imu_link_firmware::wifi_secrets;
use log::{info, warn};
use static_cell::StaticCell;

const SOCKET_BUFFER: usize = 512;

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

static APP_STATE: StaticCell<SharedAppState> = StaticCell::new();

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let config = Config {
        network: NetworkConfig {
            ssid: wifi_secrets::SSID,
            password: wifi_secrets::PASSWORD,
            ..NetworkConfig::default()
        },
        ..Config::new()
    };
    let state = APP_STATE.init(SharedAppState::new(RefCell::new(AppState::new())));

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    info!("Embassy initialized!");

    let mut indicator = create_indicator(peripherals.GPIO2);

    app_state::advance(state, AppRunState::RadioStarting);

    static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
    let radio_init =
        RADIO.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));
    let (mut wifi_controller, interfaces) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi controller");

    let net = &config.network;
    static RESOURCES: StaticCell<StackResources<STACK_SOCKETS>> = StaticCell::new();
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;
    let (stack, runner) = embassy_net::new(
        interfaces.sta,
        static_ipv4(net.client_ip, net.prefix_len, net.server_ip),
        RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(net_task(runner).expect("net task already spawned"));

    if let Err(e) = join_network(&mut wifi_controller, net, &config.retry).await {
        app_state::fail(state, e);
        app_state::park().await;
    }

    stack.wait_config_up().await;
    info!("Link up as {}/{}", net.client_ip, net.prefix_len);
    app_state::advance(state, AppRunState::LinkUp);

    let mut client = TelemetryClient::new(
        TcpDialer::<SOCKET_BUFFER>::new(stack),
        net.telemetry_endpoint(),
    )
    .with_timeout(config.client.request_timeout);
    app_state::advance(state, AppRunState::Serving);

    let mut reading = ClientReading::default();
    loop {
        if let Err(e) = client.request_reading(&mut reading).await {
            warn!("Request to {} failed: {}", client.endpoint(), e);
        }

        info!(
            "Accel: X={:.2}g Y={:.2}g Z={:.2}g Temp={:.1}°C",
            reading.accel_x, reading.accel_y, reading.accel_z, reading.temperature
        );

        indicator.set_high();
        Timer::after(config.client.pulse).await;
        indicator.set_low();

        Timer::after(config.client.rest).await;
    }
}
