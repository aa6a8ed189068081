//! Example: Run the alarm from the terminal.
//!
//! Type key sequences such as `A1234#` (arm), `D1234#` (disarm) or
//! `B1234B0654#` (change code), one per line. `open` and `close` move the
//! door. The countdown is shortened to three ticks.

use std::time::Duration;

use keypad_alarm::{Alarm, AlarmConfig, AlarmHooks, AlarmService, CountdownPolicy};
use tokio::io::{AsyncBufReadExt, BufReader};

struct Terminal;

impl AlarmHooks for Terminal {
    fn low_beep(&mut self) {
        print!("\x07");
    }

    fn medium_beep(&mut self) {
        print!("\x07");
    }

    fn high_beep(&mut self) {
        print!("\x07");
    }

    fn start_sound(&mut self) {
        println!("*** SIREN ***");
    }

    fn stop_sound(&mut self) {
        println!("(siren off)");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AlarmConfig::builder()
        .code("1234")
        .countdown(CountdownPolicy::new(3, Duration::from_secs(1)))
        .build();
    config.validate()?;

    let queue = config.command_queue;
    let (alarm, timer_events) = Alarm::new(config, Terminal);
    let handle = AlarmService::spawn(alarm, timer_events, queue);

    let mut updates = handle.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            println!(
                "[{:>4}] {} (door {})",
                keypad_alarm::keypad::visible(&snapshot.display),
                snapshot.state,
                if snapshot.door_is_open { "open" } else { "closed" }
            );
        }
    });

    println!("Code is 1234. Type keys, open/close, Ctrl+C to stop.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "open" => { handle.set_door_is_open(true).await?; }
                    "close" => { handle.set_door_is_open(false).await?; }
                    keys => { handle.type_keys(&keys.to_ascii_uppercase()).await?; }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopping...");
                break;
            }
        }
    }

    Ok(())
}
