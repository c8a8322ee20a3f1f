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
use embassy_net::{Stack, StackResources};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::Output;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;
use imu_link_core::config::{Config, NetworkConfig};
use imu_link_core::heartbeat::Heartbeat;
use imu_link_core::net::{serve_http, serve_telemetry};
use imu_link_core::sensors::Mpu6050;
use imu_link_core::telemetry::{TelemetryStore, run_acquisition};
use imu_link_firmware::app_state::{
    self, AppError, AppRunState, AppState, SharedAppState, create_i2c_bus, create_indicator,
};
use imu_link_firmware::net::TcpListener;
use imu_link_firmware::wifi::{STACK_SOCKETS, net_task, start_access_point, static_ipv4};
use imu_link_firmware::wifi_secrets;
use log::info;
use static_cell::StaticCell;

const TELEMETRY_BUFFER: usize = 512;
const HTTP_BUFFER: usize = 1024;

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
static STORE: TelemetryStore = TelemetryStore::new();
static HEARTBEAT: Heartbeat = Heartbeat::new();

#[embassy_executor::task]
async fn heartbeat_task(heartbeat: &'static Heartbeat, mut indicator: Output<'static>) -> ! {
    heartbeat.run(&mut indicator).await
}

#[embassy_executor::task]
async fn http_task(stack: Stack<'static>, port: u16) -> ! {
    let mut listener = TcpListener::<HTTP_BUFFER>::new(stack, port);
    serve_http(&mut listener).await
}

#[embassy_executor::task]
async fn telemetry_task(stack: Stack<'static>, port: u16, store: &'static TelemetryStore) -> ! {
    let mut listener = TcpListener::<TELEMETRY_BUFFER>::new(stack, port);
    serve_telemetry(&mut listener, store).await
}

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

    let indicator = create_indicator(peripherals.GPIO2);
    HEARTBEAT.init(config.heartbeat_interval_secs);
    spawner.spawn(heartbeat_task(&HEARTBEAT, indicator).expect("heartbeat task already spawned"));

    app_state::advance(state, AppRunState::RadioStarting);

    static RADIO: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
    let radio_init =
        RADIO.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));
    let (mut wifi_controller, interfaces) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi controller");

    if let Err(e) = start_access_point(&mut wifi_controller, &config.network).await {
        app_state::fail(state, e);
        app_state::park().await;
    }

    let net = &config.network;
    static RESOURCES: StaticCell<StackResources<STACK_SOCKETS>> = StaticCell::new();
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;
    let (stack, runner) = embassy_net::new(
        interfaces.ap,
        static_ipv4(net.server_ip, net.prefix_len, net.server_ip),
        RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(net_task(runner).expect("net task already spawned"));

    stack.wait_config_up().await;
    info!("Serving on {}/{}", net.server_ip, net.prefix_len);
    app_state::advance(state, AppRunState::LinkUp);

    let i2c = match create_i2c_bus(
        peripherals.I2C0,
        peripherals.GPIO4,
        peripherals.GPIO5,
        config.sensor.bus_frequency_khz,
    ) {
        Ok(i2c) => i2c,
        Err(e) => {
            app_state::fail(state, AppError::Sensor(app_state::detail(format_args!("{:?}", e))));
            app_state::park().await
        }
    };

    let mut imu = Mpu6050::new(i2c, &config.sensor);
    if let Err(e) = imu.init().await {
        app_state::fail(state, e.into());
        app_state::park().await;
    }
    app_state::advance(state, AppRunState::SensorReady);

    spawner.spawn(http_task(stack, net.http_port).expect("http task already spawned"));
    if net.serve_telemetry {
        spawner.spawn(
            telemetry_task(stack, net.telemetry_port, &STORE)
                .expect("telemetry task already spawned"),
        );
    }
    app_state::advance(state, AppRunState::Serving);

    run_acquisition(&mut imu, &STORE, config.poll_period).await
}
