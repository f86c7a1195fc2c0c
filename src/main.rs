//! ToxiRover Firmware: Main Entry Point
//!
//! Hexagonal architecture driven by a fixed-interval control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   FirebaseRestStore  Esp32Time │
//! │  (Sensor+Actuator) (EventSink)    (RemoteStore)      (Clock)   │
//! │  WifiAdapter                                                   │
//! │  (Connectivity)                                                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Avoidance · Gas alerts · Operator commands            │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  SyncClient (link lifecycle, push/pull) · Cadence timers       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use toxirover::adapters::firebase::{FirebaseConfig, FirebaseRestStore};
use toxirover::adapters::hardware::HardwareAdapter;
use toxirover::adapters::log_sink::LogEventSink;
use toxirover::adapters::time::{BlockingDelay, Esp32TimeAdapter};
use toxirover::adapters::wifi::{ConnectivityPort, WifiAdapter};
use toxirover::app::ports::ClockPort;
use toxirover::app::service::AppService;
use toxirover::config::SystemConfig;
use toxirover::drivers::hw_init;
use toxirover::drivers::motor::MotorDriver;
use toxirover::drivers::servo::ServoDriver;
use toxirover::pins::{GAS_ADC_CHANNEL, PinMap};
use toxirover::sensors::SensorHub;
use toxirover::sensors::gas::GasSensor;
use toxirover::sensors::ultrasonic::UltrasonicSensor;
use toxirover::sync::SyncClient;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  ToxiRover v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Validate wiring and tunables (fatal) ───────────────
    let pins = PinMap::default();
    if let Err(e) = pins.validate() {
        error!("Pin map rejected: {e}");
        return Err(toxirover::Error::from(e)).context("pin configuration");
    }
    let config = SystemConfig::default();
    if let Err(e) = config.validate() {
        error!("Config rejected: {e}");
        return Err(toxirover::Error::from(e)).context("system configuration");
    }

    // ── 3. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals(&pins) {
        error!("Peripheral init failed: {e}");
        return Err(toxirover::Error::from(e)).context("peripheral init");
    }

    let sensor_hub = SensorHub::new(
        UltrasonicSensor::new(pins.ultrasonic_trig, pins.ultrasonic_echo, config.echo_timeout_us),
        GasSensor::new(GAS_ADC_CHANNEL, pins.gas_digital, config.gas_ppm_per_count),
        BlockingDelay,
    );
    let mut hw = HardwareAdapter::new(
        sensor_hub,
        MotorDriver::new(&pins),
        ServoDriver::new(config.center_angle),
    );
    let clock = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();

    // ── 4. Network ────────────────────────────────────────────
    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();
    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, nvs)?;
    match (option_env!("WIFI_SSID"), option_env!("WIFI_PASS")) {
        (Some(ssid), pass) => {
            wifi.set_credentials(ssid, pass.unwrap_or(""))?;
            if let Err(e) = wifi.connect() {
                warn!("WiFi unavailable at boot ({e}), sync will retry");
            }
        }
        (None, _) => warn!("WIFI_SSID not set at build time, running offline"),
    }

    let Some(remote) = FirebaseConfig::from_build_env(config.http_timeout_ms) else {
        anyhow::bail!("FIREBASE_HOST not set at build time");
    };
    info!("Remote store: {}", remote.host);
    let mut sync = SyncClient::new(
        FirebaseRestStore::new(remote),
        BlockingDelay,
        config.reconnect_backoff_ms,
        config.center_angle,
    );

    // ── 5. Application core ───────────────────────────────────
    let loop_interval_ms = config.control_loop_interval_ms;
    let mut app = AppService::new(config);
    app.start(&mut hw, &mut sink);
    app.connect(&mut sync, clock.now_ms(), &mut sink);

    info!("Entering control loop ({}ms)", loop_interval_ms);
    loop {
        if !sync.is_connected() && !wifi.is_connected() {
            if let Err(e) = wifi.ensure_connected() {
                warn!("WiFi reconnect failed: {e}");
            }
        }
        app.tick(&mut hw, &mut sync, clock.now_ms(), &mut sink);
        FreeRtos::delay_ms(loop_interval_ms);
    }
}
