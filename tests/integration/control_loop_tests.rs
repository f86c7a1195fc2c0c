//! Control loop end-to-end: scripted distance and gas samples through
//! `AppService::tick`, with the in-memory store on the sync side.

use serde_json::json;
use toxirover::adapters::memory_store::MemoryStore;
use toxirover::app::events::AppEvent;
use toxirover::app::service::AppService;
use toxirover::config::SystemConfig;
use toxirover::drivers::motor::Drive;
use toxirover::sensors::distance::HazardZone;
use toxirover::sync::{SyncClient, paths};

use crate::mock_hw::{ActuatorCall, MockHardware, NoDelay, RecordingSink};

const T0: u64 = 10_000;
const STEP_MS: u64 = 500;

type Sync = SyncClient<MemoryStore, NoDelay>;

fn make_app() -> (AppService, MockHardware, Sync, RecordingSink) {
    let config = SystemConfig::default();
    let mut app = AppService::new(config);
    let mut hw = MockHardware::new();
    let mut sync = SyncClient::new(MemoryStore::new(), NoDelay, 0, 90);
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);
    app.connect(&mut sync, 0, &mut sink);
    hw.calls.clear();
    (app, hw, sync, sink)
}

/// Feed `ranges` at `STEP_MS` intervals from `T0`, returning the zone after
/// each tick.
fn run_script(
    app: &mut AppService,
    hw: &mut MockHardware,
    sync: &mut Sync,
    sink: &mut RecordingSink,
    ranges: &[f32],
) -> Vec<HazardZone> {
    ranges
        .iter()
        .enumerate()
        .map(|(i, &cm)| {
            hw.range_cm = Some(cm);
            app.tick(hw, sync, T0 + i as u64 * STEP_MS, sink);
            app.avoidance().current_zone()
        })
        .collect()
}

// ── Scripted scenario ────────────────────────────────────────

#[test]
fn scenario_fires_once_and_safe_tail_releases_latch() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();

    // With warning=50, 80 and 60 sit above the warning threshold.
    let zones = run_script(
        &mut app,
        &mut hw,
        &mut sync,
        &mut sink,
        &[120.0, 80.0, 15.0, 15.0, 15.0, 60.0],
    );
    assert_eq!(
        zones,
        [
            HazardZone::Safe,
            HazardZone::Safe,
            HazardZone::Danger,
            HazardZone::Danger,
            HazardZone::Danger,
            HazardZone::Safe,
        ]
    );
    assert_eq!(app.avoidance().trigger_count(), 1);
    assert_eq!(hw.drives(), [(Drive::Reverse, 100)]);
    assert!(!app.avoidance().is_triggered());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ManeuverStarted { .. })), 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::LatchCleared)), 1);
}

#[test]
fn scenario_with_warning_tail_stays_latched() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();

    let zones = run_script(
        &mut app,
        &mut hw,
        &mut sync,
        &mut sink,
        &[120.0, 35.0, 15.0, 15.0, 15.0, 45.0],
    );
    assert_eq!(
        zones,
        [
            HazardZone::Safe,
            HazardZone::Warning,
            HazardZone::Danger,
            HazardZone::Danger,
            HazardZone::Danger,
            HazardZone::Warning,
        ]
    );
    assert_eq!(app.avoidance().trigger_count(), 1);
    assert!(app.avoidance().is_triggered());

    // Danger again long after the cooldown: still latched.
    hw.range_cm = Some(10.0);
    app.tick(&mut hw, &mut sync, T0 + 20_000, &mut sink);
    assert_eq!(app.avoidance().trigger_count(), 1);
}

#[test]
fn maneuver_reverses_then_stops_and_centres() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();

    hw.range_cm = Some(12.0);
    app.tick(&mut hw, &mut sync, T0, &mut sink);
    assert_eq!(
        hw.calls,
        [
            ActuatorCall::Drive {
                drive: Drive::Reverse,
                speed_pct: 100
            },
            ActuatorCall::Steer(180),
        ]
    );
    assert!(app.avoidance().is_maneuvering());

    // Before the scheduled end nothing new happens.
    app.tick(&mut hw, &mut sync, T0 + 400, &mut sink);
    assert_eq!(hw.calls.len(), 2);

    app.tick(&mut hw, &mut sync, T0 + 500, &mut sink);
    assert!(!app.avoidance().is_maneuvering());
    assert_eq!(&hw.calls[2..], [ActuatorCall::Stop, ActuatorCall::Steer(90)]);
    assert!(!hw.motor_running());
}

#[test]
fn obstacle_raises_alert_in_same_tick() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();
    hw.range_cm = Some(8.0);
    app.tick(&mut hw, &mut sync, T0, &mut sink);

    let alerts = sync.store().pushed(paths::ALERTS);
    let last = alerts.last().copied().cloned();
    assert_eq!(
        last.as_ref().and_then(|a| a.get("type")).cloned(),
        Some(json!("OBSTACLE_DETECTED"))
    );
    assert_eq!(
        sync.store().value(paths::ALERT_LAST_KIND),
        Some(&json!("OBSTACLE_DETECTED"))
    );
}

#[test]
fn echo_timeout_is_error_zone_and_never_triggers() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();
    hw.range_cm = None;
    for i in 0..10 {
        app.tick(&mut hw, &mut sync, T0 + i * 100, &mut sink);
    }
    assert_eq!(app.avoidance().current_zone(), HazardZone::Error);
    assert_eq!(app.avoidance().trigger_count(), 0);
    assert!(hw.drives().is_empty());
}

#[test]
fn gas_alert_is_edge_triggered() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();

    let mut t = T0;
    for ppm in [100.0, 520.0, 560.0, 610.0, 350.0, 120.0, 700.0] {
        hw.gas_ppm = ppm;
        app.tick(&mut hw, &mut sync, t, &mut sink);
        t += 100;
    }
    let high_gas = sync
        .store()
        .pushed(paths::ALERTS)
        .into_iter()
        .filter(|a| a.get("type") == Some(&json!("HIGH_GAS_LEVEL")))
        .count();
    assert_eq!(high_gas, 2);
}

#[test]
fn telemetry_follows_cadence() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();
    hw.range_cm = Some(64.5);

    // 100 ms ticks for 5 s with a 2 s telemetry interval: t=0, 2000, 4000.
    for i in 0..50 {
        app.tick(&mut hw, &mut sync, i * 100, &mut sink);
    }
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Telemetry(_))), 3);
    assert_eq!(sync.last_update_ms(), Some(4_000));
    assert_eq!(sync.store().value(paths::DISTANCE), Some(&json!(64.5)));
    assert_eq!(
        sync.store().value("/sensor_data/distance_status"),
        Some(&json!("SAFE"))
    );
    assert_eq!(app.tick_count(), 50);
}

#[test]
fn gas_detection_published_from_comparator_or_ppm() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();
    let detected = |sync: &Sync| sync.store().value("/sensor_data/gas_detected").cloned();

    app.tick(&mut hw, &mut sync, T0, &mut sink);
    assert_eq!(detected(&sync), Some(json!(false)));

    // Comparator trips below the analog warning level.
    hw.gas_comparator = true;
    app.tick(&mut hw, &mut sync, T0 + 2_000, &mut sink);
    assert_eq!(detected(&sync), Some(json!(true)));
    assert_eq!(
        sync.store().value("/sensor_data/gas_level"),
        Some(&json!("SAFE"))
    );

    hw.gas_comparator = false;
    hw.gas_ppm = 150.0;
    app.tick(&mut hw, &mut sync, T0 + 4_000, &mut sink);
    assert_eq!(detected(&sync), Some(json!(true)));
}

#[test]
fn control_continues_while_offline() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();
    sync.store_mut().set_offline(true);

    hw.range_cm = Some(150.0);
    app.tick(&mut hw, &mut sync, T0, &mut sink);
    // Telemetry write failure demotes the link.
    assert!(!sync.is_connected());

    hw.range_cm = Some(10.0);
    app.tick(&mut hw, &mut sync, T0 + 100, &mut sink);
    assert_eq!(app.avoidance().trigger_count(), 1);
    assert_eq!(hw.drives(), [(Drive::Reverse, 100)]);
}
