//! Example: Scripted walk through arming, an intrusion and a disarm,
//! printing every state change as a Home Assistant payload.

use std::time::Duration;

use keypad_alarm::bridge::homeassistant;
use keypad_alarm::{Alarm, AlarmConfig, AlarmService, CountdownPolicy, NoopHooks};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let tick = Duration::from_millis(200);
    let config = AlarmConfig::builder()
        .code("0654")
        .countdown(CountdownPolicy::new(5, tick))
        .display_clear_delay(Duration::from_secs(1))
        .build();
    config.validate()?;

    let queue = config.command_queue;
    let (alarm, timer_events) = Alarm::new(config, NoopHooks);
    let handle = AlarmService::spawn(alarm, timer_events, queue);

    let mut updates = handle.subscribe();
    let printer = tokio::spawn(async move {
        let mut last = updates.borrow_and_update().state;
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            if snapshot.state != last {
                println!(
                    "alarm: {:<10} door: {}",
                    homeassistant::alarm_payload(snapshot.state),
                    homeassistant::door_payload(snapshot.door_is_open)
                );
                last = snapshot.state;
            }
        }
    });

    println!("Arming...");
    handle.type_keys("A0654#").await?;
    tokio::time::sleep(tick * 6).await;

    println!("Opening the door...");
    handle.set_door_is_open(true).await?;
    tokio::time::sleep(tick * 2).await;

    println!("Disarming before the countdown ends...");
    handle.type_keys("D0654#").await?;
    handle.set_door_is_open(false).await?;

    println!("Arming again and leaving the door open...");
    handle.arm().await?;
    handle.set_door_is_open(true).await?;
    tokio::time::sleep(tick * 6).await;

    let snapshot = handle.disarm().await?;
    println!("Final state: {}", snapshot.state);

    drop(handle);
    printer.await?;
    Ok(())
}
