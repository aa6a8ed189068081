// MIT License - Copyright (c) 2026 Peter Wright
// Single-task owner of the alarm

use std::fmt;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info};

use crate::alarm::Alarm;
use crate::error::Result;
use crate::hooks::AlarmHooks;
use crate::state::{AlarmSnapshot, AlarmState};
use crate::timer::TimerEvents;

/// Transitions a network bridge may request directly, bypassing the keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteRequest {
    Arm,
    Arming,
    Disarm,
    Triggering,
    Trigger,
}

impl RemoteRequest {
    /// The request that moves the alarm towards `state`.
    pub fn towards(state: AlarmState) -> Self {
        match state {
            AlarmState::Disarmed => Self::Disarm,
            AlarmState::Arming => Self::Arming,
            AlarmState::Armed => Self::Arm,
            AlarmState::Triggering => Self::Triggering,
            AlarmState::Triggered => Self::Trigger,
        }
    }
}

impl fmt::Display for RemoteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Arm => "arm",
            Self::Arming => "arming",
            Self::Disarm => "disarm",
            Self::Triggering => "triggering",
            Self::Trigger => "trigger",
        })
    }
}

#[derive(Debug)]
enum Input {
    Key(char),
    Door(bool),
    Remote(RemoteRequest),
}

#[derive(Debug)]
struct AlarmCommand {
    input: Input,
    reply: oneshot::Sender<AlarmSnapshot>,
}

/// Runs an [`Alarm`] on its own task.
///
/// Keypad input, door samples, remote requests and countdown events all
/// pass through this one task, in arrival order. After each of them the
/// new [`AlarmSnapshot`] is published to watchers.
pub struct AlarmService<H: AlarmHooks> {
    alarm: Alarm<H>,
    timer_events: TimerEvents,
    commands: mpsc::Receiver<AlarmCommand>,
    snapshot_tx: watch::Sender<AlarmSnapshot>,
}

impl<H: AlarmHooks> AlarmService<H> {
    /// Move the alarm onto a new task and return a handle to it.
    ///
    /// The task stops once every handle has been dropped.
    pub fn spawn(alarm: Alarm<H>, timer_events: TimerEvents, queue: usize) -> AlarmHandle {
        let (command_tx, commands) = mpsc::channel(queue);
        let (snapshot_tx, snapshot_rx) = watch::channel(alarm.snapshot());
        let service = Self {
            alarm,
            timer_events,
            commands,
            snapshot_tx,
        };
        tokio::spawn(service.run());
        AlarmHandle {
            command_tx,
            snapshot_rx,
        }
    }

    async fn run(mut self) {
        info!("Alarm service started in state {}", self.alarm.state());
        loop {
            tokio::select! {
                // Commands first: a disarm waiting in the queue wins over a
                // countdown that expires at the same moment
                biased;
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    self.apply(command.input);
                    let snapshot = self.publish();
                    let _ = command.reply.send(snapshot);
                }
                Some(event) = self.timer_events.recv() => {
                    self.alarm.on_timer(event);
                    self.publish();
                }
            }
        }
        debug!("Alarm service stopped");
    }

    fn apply(&mut self, input: Input) {
        match input {
            Input::Key(key) => self.alarm.key_pressed(key),
            Input::Door(open) => self.alarm.set_door_is_open(open),
            Input::Remote(request) => {
                info!("Remote request: {request}");
                match request {
                    RemoteRequest::Arm => self.alarm.arm(),
                    RemoteRequest::Arming => self.alarm.arming(),
                    RemoteRequest::Disarm => self.alarm.disarm(),
                    RemoteRequest::Triggering => self.alarm.triggering(),
                    RemoteRequest::Trigger => self.alarm.trigger(),
                }
            }
        }
    }

    fn publish(&self) -> AlarmSnapshot {
        let snapshot = self.alarm.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                current.clone_from(&snapshot);
                true
            }
        });
        snapshot
    }
}

/// Cloneable handle to a running [`AlarmService`].
///
/// Every operation waits until the service has applied it and returns the
/// resulting snapshot, so a caller that awaited `disarm()` can never observe
/// a pre-disarm state afterwards.
#[derive(Clone)]
pub struct AlarmHandle {
    command_tx: mpsc::Sender<AlarmCommand>,
    snapshot_rx: watch::Receiver<AlarmSnapshot>,
}

impl AlarmHandle {
    pub async fn key_pressed(&self, key: char) -> Result<AlarmSnapshot> {
        self.send(Input::Key(key)).await
    }

    /// Press each key of `keys` in order. Returns the snapshot after the last.
    pub async fn type_keys(&self, keys: &str) -> Result<AlarmSnapshot> {
        let mut snapshot = self.snapshot();
        for key in keys.chars() {
            snapshot = self.key_pressed(key).await?;
        }
        Ok(snapshot)
    }

    pub async fn set_door_is_open(&self, open: bool) -> Result<AlarmSnapshot> {
        self.send(Input::Door(open)).await
    }

    pub async fn apply(&self, request: RemoteRequest) -> Result<AlarmSnapshot> {
        self.send(Input::Remote(request)).await
    }

    pub async fn arm(&self) -> Result<AlarmSnapshot> {
        self.apply(RemoteRequest::Arm).await
    }

    pub async fn disarm(&self) -> Result<AlarmSnapshot> {
        self.apply(RemoteRequest::Disarm).await
    }

    pub async fn arming(&self) -> Result<AlarmSnapshot> {
        self.apply(RemoteRequest::Arming).await
    }

    pub async fn triggering(&self) -> Result<AlarmSnapshot> {
        self.apply(RemoteRequest::Triggering).await
    }

    pub async fn trigger(&self) -> Result<AlarmSnapshot> {
        self.apply(RemoteRequest::Trigger).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> AlarmSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Watch snapshots as they change.
    pub fn subscribe(&self) -> watch::Receiver<AlarmSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Whether the service task has exited.
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    async fn send(&self, input: Input) -> Result<AlarmSnapshot> {
        let (reply, response) = oneshot::channel();
        self.command_tx.send(AlarmCommand { input, reply }).await?;
        Ok(response.await?)
    }
}
