// MIT License - Copyright (c) 2026 Peter Wright
// Keypad alarm controller
//
//! # keypad-alarm
//!
//! A door alarm driven by a numeric keypad and a reed switch.
//!
//! The [`Alarm`] state machine turns key presses and door samples into
//! arm / disarm / trigger transitions, checks the secret code and runs the
//! cancellable exit and entry countdowns. Hardware stays behind the
//! [`AlarmHooks`] trait, so the core runs headless in tests.
//!
//! [`AlarmService`] moves an alarm onto its own task and hands out a
//! cloneable [`AlarmHandle`]; the [`bridge`] module maps alarm state to and
//! from Home Assistant MQTT payloads and IoT shadow documents.
//!
//! ## Quick Start
//!
//! ```no_run
//! use keypad_alarm::{Alarm, AlarmConfig, AlarmService, NoopHooks};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AlarmConfig::builder().code("0654").build();
//!     config.validate()?;
//!
//!     let queue = config.command_queue;
//!     let (alarm, timer_events) = Alarm::new(config, NoopHooks);
//!     let handle = AlarmService::spawn(alarm, timer_events, queue);
//!
//!     let mut updates = handle.subscribe();
//!     tokio::spawn(async move {
//!         while updates.changed().await.is_ok() {
//!             let snapshot = updates.borrow_and_update().clone();
//!             println!("{} [{}]", snapshot.state, snapshot.display);
//!         }
//!     });
//!
//!     handle.type_keys("A0654#").await?;
//!     handle.set_door_is_open(true).await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     Ok(())
//! }
//! ```

pub mod alarm;
pub mod bridge;
pub mod command;
pub mod config;
pub mod error;
pub mod hooks;
pub mod keypad;
pub mod service;
pub mod state;
pub mod timer;

// Re-exports for convenience
pub use alarm::Alarm;
pub use config::{AlarmConfig, AlarmConfigBuilder, CountdownPolicy};
pub use error::{AlarmError, Result};
pub use hooks::{AlarmHooks, NoopHooks};
pub use service::{AlarmHandle, AlarmService, RemoteRequest};
pub use state::{AlarmSnapshot, AlarmState};
pub use timer::{TimerEvent, TimerEvents, TimerKind};
