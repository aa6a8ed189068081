// Integration tests for the alarm service
//
// Drive a spawned alarm through its handle with tokio's clock paused, so
// countdowns complete instantly and in a deterministic order.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use keypad_alarm::{
    Alarm, AlarmConfig, AlarmError, AlarmHandle, AlarmHooks, AlarmService, AlarmState,
    RemoteRequest,
};

#[derive(Default)]
struct Siren {
    starts: AtomicU32,
    stops: AtomicU32,
}

struct SharedHooks(Arc<Siren>);

impl AlarmHooks for SharedHooks {
    fn start_sound(&mut self) {
        self.0.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop_sound(&mut self) {
        self.0.stops.fetch_add(1, Ordering::SeqCst);
    }
}

fn spawn_alarm() -> (AlarmHandle, Arc<Siren>) {
    let siren = Arc::new(Siren::default());
    let config = AlarmConfig::builder().code("1234").build();
    let queue = config.command_queue;
    let (alarm, timer_events) = Alarm::new(config, SharedHooks(siren.clone()));
    (AlarmService::spawn(alarm, timer_events, queue), siren)
}

async fn wait(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

// =========================================================================
// Keypad
// =========================================================================

#[tokio::test(start_paused = true)]
async fn keypad_arms_after_countdown() {
    let (handle, _) = spawn_alarm();

    let snapshot = handle.type_keys("A1234#").await.unwrap();
    assert_eq!(snapshot.state, AlarmState::Arming);

    wait(11).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.state, AlarmState::Armed);
    assert_eq!(snapshot.display, "Armd");

    // Acknowledgement clears after the display delay
    wait(5).await;
    assert_eq!(handle.snapshot().display, "");
}

#[tokio::test(start_paused = true)]
async fn keypad_wrong_code_stays_disarmed() {
    let (handle, _) = spawn_alarm();

    let snapshot = handle.type_keys("A9999#").await.unwrap();
    assert_eq!(snapshot.state, AlarmState::Disarmed);

    wait(11).await;
    assert_eq!(handle.snapshot().state, AlarmState::Disarmed);
}

#[tokio::test(start_paused = true)]
async fn keypad_disarm_mid_countdown() {
    let (handle, _) = spawn_alarm();

    handle.type_keys("A1234#").await.unwrap();
    wait(3).await;
    assert_eq!(handle.snapshot().state, AlarmState::Arming);

    let snapshot = handle.type_keys("D1234#").await.unwrap();
    assert_eq!(snapshot.state, AlarmState::Disarmed);
    assert_eq!(snapshot.display, "disa");

    // The cancelled countdown never arms
    wait(20).await;
    assert_eq!(handle.snapshot().state, AlarmState::Disarmed);
}

#[tokio::test(start_paused = true)]
async fn keypad_code_change_applies_to_later_commands() {
    let (handle, _) = spawn_alarm();

    let snapshot = handle.type_keys("B1234B0654#").await.unwrap();
    assert_eq!(snapshot.code, "0654");

    let snapshot = handle.type_keys("A1234#").await.unwrap();
    assert_eq!(snapshot.state, AlarmState::Disarmed);

    let snapshot = handle.type_keys("A0654#").await.unwrap();
    assert_eq!(snapshot.state, AlarmState::Arming);
}

// =========================================================================
// Door
// =========================================================================

#[tokio::test(start_paused = true)]
async fn door_open_while_armed_triggers_then_sounds() {
    let (handle, siren) = spawn_alarm();

    handle.arm().await.unwrap();
    let snapshot = handle.set_door_is_open(true).await.unwrap();
    assert_eq!(snapshot.state, AlarmState::Triggering);
    assert!(snapshot.door_is_open);

    wait(11).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.state, AlarmState::Triggered);
    assert_eq!(snapshot.display, "Alrm");
    assert_eq!(siren.starts.load(Ordering::SeqCst), 1);

    let snapshot = handle.type_keys("D1234#").await.unwrap();
    assert_eq!(snapshot.state, AlarmState::Disarmed);
    assert!(siren.stops.load(Ordering::SeqCst) >= 1);
}

#[tokio::test(start_paused = true)]
async fn door_open_while_disarmed_is_only_recorded() {
    let (handle, siren) = spawn_alarm();

    let snapshot = handle.set_door_is_open(true).await.unwrap();
    assert_eq!(snapshot.state, AlarmState::Disarmed);
    assert!(snapshot.door_is_open);

    wait(30).await;
    assert_eq!(handle.snapshot().state, AlarmState::Disarmed);
    assert_eq!(siren.starts.load(Ordering::SeqCst), 0);
}

// =========================================================================
// Remote requests
// =========================================================================

#[tokio::test(start_paused = true)]
async fn remote_disarm_cancels_entry_countdown() {
    let (handle, siren) = spawn_alarm();

    handle.apply(RemoteRequest::Arm).await.unwrap();
    handle.set_door_is_open(true).await.unwrap();
    wait(4).await;

    let snapshot = handle.apply(RemoteRequest::Disarm).await.unwrap();
    assert_eq!(snapshot.state, AlarmState::Disarmed);

    wait(20).await;
    assert_eq!(handle.snapshot().state, AlarmState::Disarmed);
    assert_eq!(siren.starts.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn remote_trigger_is_immediate() {
    let (handle, siren) = spawn_alarm();

    let snapshot = handle.trigger().await.unwrap();
    assert_eq!(snapshot.state, AlarmState::Triggered);
    assert_eq!(siren.starts.load(Ordering::SeqCst), 1);

    // Already sounding: an entry countdown request is ignored
    let snapshot = handle.triggering().await.unwrap();
    assert_eq!(snapshot.state, AlarmState::Triggered);
}

#[tokio::test(start_paused = true)]
async fn remote_arming_rejected_unless_disarmed() {
    let (handle, _) = spawn_alarm();

    handle.arm().await.unwrap();
    let snapshot = handle.arming().await.unwrap();
    assert_eq!(snapshot.state, AlarmState::Armed);
}

// =========================================================================
// Observation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn subscriber_sees_countdown() {
    let (handle, _) = spawn_alarm();
    let mut updates = handle.subscribe();
    assert_eq!(updates.borrow_and_update().state, AlarmState::Disarmed);

    handle.arming().await.unwrap();

    let mut states = Vec::new();
    let mut displays = Vec::new();
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        if states.last() != Some(&snapshot.state) {
            states.push(snapshot.state);
        }
        displays.push(snapshot.display.clone());
        if snapshot.state == AlarmState::Armed {
            break;
        }
    }

    assert_eq!(states, vec![AlarmState::Arming, AlarmState::Armed]);
    assert!(displays.contains(&"1".to_string()));
    assert_eq!(displays.last().map(String::as_str), Some("Armd"));
}

#[tokio::test(start_paused = true)]
async fn service_outlives_dropped_clones() {
    let (handle, _) = spawn_alarm();
    assert!(!handle.is_closed());

    let clone = handle.clone();
    clone.arm().await.unwrap();
    drop(clone);

    assert!(!handle.is_closed());
    assert_eq!(handle.snapshot().state, AlarmState::Armed);
    assert!(handle.disarm().await.is_ok());
}

#[test]
fn channel_closed_is_shutdown() {
    assert!(AlarmError::ChannelClosed.is_shutdown());
}
