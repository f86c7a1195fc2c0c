//! Remote store round trips: operator commands written to the store are
//! applied by the control loop exactly once, and link outages are
//! recovered on the reconnect cadence.

use serde_json::json;
use toxirover::adapters::memory_store::MemoryStore;
use toxirover::app::commands::MotionCommand;
use toxirover::app::events::AppEvent;
use toxirover::app::service::AppService;
use toxirover::config::SystemConfig;
use toxirover::drivers::motor::Drive;
use toxirover::error::TransportError;
use toxirover::sync::{ConnectionState, LinkUp, SyncClient, paths};

use crate::mock_hw::{ActuatorCall, MockHardware, NoDelay, RecordingSink};

const T0: u64 = 10_000;

type Sync = SyncClient<MemoryStore, NoDelay>;

fn make_app() -> (AppService, MockHardware, Sync, RecordingSink) {
    let mut app = AppService::new(SystemConfig::default());
    let mut hw = MockHardware::new();
    let mut sync = SyncClient::new(MemoryStore::new(), NoDelay, 0, 90);
    let mut sink = RecordingSink::new();
    app.start(&mut hw, &mut sink);
    app.connect(&mut sync, 0, &mut sink);
    hw.calls.clear();
    (app, hw, sync, sink)
}

fn alert_types(sync: &Sync) -> Vec<String> {
    sync.store()
        .pushed(paths::ALERTS)
        .into_iter()
        .filter_map(|a| a.get("type").and_then(|t| t.as_str()).map(str::to_owned))
        .collect()
}

// ── Connection lifecycle ─────────────────────────────────────

#[test]
fn alternating_attempts_follow_state_table() {
    let mut sync: Sync = SyncClient::new(MemoryStore::new(), NoDelay, 0, 90);
    let mut states = vec![sync.state()];

    for online in [false, true, false, true] {
        sync.store_mut().set_offline(!online);
        let _ = sync.reconnect();
        states.push(sync.state());
    }
    assert_eq!(
        states,
        [
            ConnectionState::Disconnected,
            ConnectionState::Error,
            ConnectionState::Connected,
            ConnectionState::Error,
            ConnectionState::Connected,
        ]
    );
}

#[test]
fn state_only_changes_on_attempts() {
    let mut sync: Sync = SyncClient::new(MemoryStore::new(), NoDelay, 0, 90);
    assert_eq!(sync.connect(), Ok(LinkUp::First));
    // Going offline alone changes nothing until the link is used.
    sync.store_mut().set_offline(true);
    assert_eq!(sync.state(), ConnectionState::Connected);
}

#[test]
fn startup_alert_and_online_status() {
    let (_, _, sync, sink) = make_app();
    assert_eq!(alert_types(&sync), ["SYSTEM_STARTUP"]);
    assert_eq!(sync.store().value(paths::STATUS), Some(&json!("ONLINE")));
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::LinkChanged {
                to: ConnectionState::Connected,
                ..
            }
        )),
        1
    );
}

#[test]
fn outage_recovers_on_reconnect_cadence_with_connection_lost_alert() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();

    sync.store_mut().set_offline(true);
    app.tick(&mut hw, &mut sync, T0, &mut sink);
    assert_eq!(sync.state(), ConnectionState::Error);

    // Reconnect cadence is 2 s; the first retry fires on the next tick.
    app.tick(&mut hw, &mut sync, T0 + 100, &mut sink);
    app.tick(&mut hw, &mut sync, T0 + 200, &mut sink);
    assert!(!sync.is_connected());

    sync.store_mut().set_offline(false);
    app.tick(&mut hw, &mut sync, T0 + 1_000, &mut sink);
    assert!(!sync.is_connected(), "cadence not yet due");

    app.tick(&mut hw, &mut sync, T0 + 2_100, &mut sink);
    assert!(sync.is_connected());
    assert_eq!(alert_types(&sync), ["SYSTEM_STARTUP", "CONNECTION_LOST"]);
}

// ── Operator commands ────────────────────────────────────────

#[test]
fn motion_request_applied_once_and_cleared() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();
    sync.store_mut().seed(paths::MOTION_REQUEST, json!("forward"));

    app.tick(&mut hw, &mut sync, T0, &mut sink);
    assert_eq!(app.motion(), MotionCommand::Forward);
    assert_eq!(hw.drives(), [(Drive::Forward, 80)]);
    assert!(sync.store().value(paths::MOTION_REQUEST).is_none());

    // Later polls see nothing new.
    app.tick(&mut hw, &mut sync, T0 + 600, &mut sink);
    app.tick(&mut hw, &mut sync, T0 + 1_200, &mut sink);
    assert_eq!(hw.drives().len(), 1);
}

#[test]
fn unknown_motion_is_consumed_and_ignored() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();
    sync.store_mut().seed(paths::MOTION_REQUEST, json!("JUMP"));
    app.tick(&mut hw, &mut sync, T0, &mut sink);
    assert_eq!(app.motion(), MotionCommand::Stop);
    assert!(hw.drives().is_empty());
    assert!(sync.store().value(paths::MOTION_REQUEST).is_none());
}

#[test]
fn servo_request_out_of_range_is_left_in_place() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();
    sync.store_mut().seed(paths::SERVO_REQUEST, json!(200));
    app.tick(&mut hw, &mut sync, T0, &mut sink);
    assert!(!hw.calls.iter().any(|c| matches!(c, ActuatorCall::Steer(_))));
    assert_eq!(sync.store().value(paths::SERVO_REQUEST), Some(&json!(200)));

    sync.store_mut().seed(paths::SERVO_REQUEST, json!(45));
    app.tick(&mut hw, &mut sync, T0 + 600, &mut sink);
    assert_eq!(hw.calls.last(), Some(&ActuatorCall::Steer(45)));
    assert!(sync.store().value(paths::SERVO_REQUEST).is_none());
}

#[test]
fn remote_emergency_stop_interrupts_maneuver() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();
    sync.store_mut().seed(paths::EMERGENCY_STOP, json!(true));

    // The maneuver fires in the avoidance step, the stop lands in the
    // sync step of the same tick.
    hw.range_cm = Some(10.0);
    app.tick(&mut hw, &mut sync, T0, &mut sink);
    assert_eq!(app.avoidance().trigger_count(), 1);
    assert!(!app.avoidance().is_maneuvering());
    assert!(!app.avoidance().is_triggered());
    assert!(!hw.motor_running());
    assert_eq!(hw.calls.last(), Some(&ActuatorCall::Steer(90)));
    assert!(sync.store().value(paths::EMERGENCY_STOP).is_none());
    assert!(alert_types(&sync).contains(&"EMERGENCY_STOP".to_owned()));
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::EmergencyStop {
                interrupted_maneuver: true
            }
        )),
        1
    );

    // Danger persists but the cooldown runs from the stop.
    app.tick(&mut hw, &mut sync, T0 + 1_000, &mut sink);
    assert_eq!(app.avoidance().trigger_count(), 1);
    app.tick(&mut hw, &mut sync, T0 + 2_000, &mut sink);
    assert_eq!(app.avoidance().trigger_count(), 2);
}

#[test]
fn tuning_applied_through_store() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();
    sync.store_mut().seed(paths::TUNING_THRESHOLD, json!(30));
    sync.store_mut().seed(paths::TUNING_ROTATION_DURATION, json!(800));
    app.tick(&mut hw, &mut sync, T0, &mut sink);

    assert_eq!(app.config().danger_threshold_cm, 30.0);
    assert_eq!(app.config().maneuver_duration_ms, 800);
    assert!(sync.store().value("/ultrasonic_servo").is_none());

    // 25 cm is now Danger.
    hw.range_cm = Some(25.0);
    app.tick(&mut hw, &mut sync, T0 + 100, &mut sink);
    assert_eq!(app.avoidance().trigger_count(), 1);
}

#[test]
fn rejected_threshold_does_not_drop_other_tuning() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();
    // The UI slider tops out at 50 cm, which collides with the warning band.
    sync.store_mut().seed(paths::TUNING_THRESHOLD, json!(50));
    sync.store_mut().seed(paths::TUNING_MOTOR_SPEED, json!(128));
    sync.store_mut().seed(paths::TUNING_ROTATION_DURATION, json!(800));
    app.tick(&mut hw, &mut sync, T0, &mut sink);

    assert_eq!(app.config().danger_threshold_cm, 20.0);
    assert_eq!(app.config().maneuver_speed_pct, 50);
    assert_eq!(app.config().maneuver_duration_ms, 800);
    assert!(sync.store().value("/ultrasonic_servo").is_none());

    // The next maneuver runs with the accepted overrides.
    hw.range_cm = Some(10.0);
    app.tick(&mut hw, &mut sync, T0 + 100, &mut sink);
    assert_eq!(hw.drives(), vec![(Drive::Reverse, 50)]);
}

#[test]
fn remote_reset_clears_latch() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();
    hw.range_cm = Some(10.0);
    app.tick(&mut hw, &mut sync, T0, &mut sink);
    hw.range_cm = Some(40.0);
    app.tick(&mut hw, &mut sync, T0 + 500, &mut sink);
    assert!(app.avoidance().is_triggered());

    sync.store_mut().seed(paths::AVOIDANCE_RESET, json!(true));
    app.tick(&mut hw, &mut sync, T0 + 1_000, &mut sink);
    assert!(!app.avoidance().is_triggered());
    assert!(sync.store().value(paths::AVOIDANCE_RESET).is_none());
}

#[test]
fn failed_clear_does_not_replay_after_recovery() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();
    sync.store_mut().seed(paths::MOTION_REQUEST, json!("LEFT"));
    sync.store_mut().fail_delete(paths::MOTION_REQUEST);

    app.tick(&mut hw, &mut sync, T0, &mut sink);
    assert_eq!(hw.drives(), [(Drive::TurnLeft, 80)]);
    assert_eq!(sync.state(), ConnectionState::Error);

    sync.store_mut().heal();
    for i in 1..=30 {
        app.tick(&mut hw, &mut sync, T0 + i * 100, &mut sink);
    }
    assert!(sync.is_connected());
    assert_eq!(hw.drives().len(), 1);
    assert!(sync.store().value(paths::MOTION_REQUEST).is_none());
}

#[test]
fn rejected_write_is_a_link_failure() {
    let (mut app, mut hw, mut sync, mut sink) = make_app();
    sync.store_mut()
        .fail_path(paths::SENSOR_DATA, TransportError::Rejected(401));
    app.tick(&mut hw, &mut sync, T0, &mut sink);
    assert_eq!(sync.state(), ConnectionState::Error);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Telemetry(_))), 0);
}
