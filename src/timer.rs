// MIT License - Copyright (c) 2026 Peter Wright
// Cancellable countdowns

use std::fmt;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::debug;

use crate::config::CountdownPolicy;

/// Identifies one started timer. Ids are never reused within an alarm.
pub type TimerId = u64;

/// What a timer is counting down to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Exit countdown; expiry arms the alarm.
    Arming,
    /// Entry countdown; expiry sounds the alarm.
    Triggering,
    /// Blanks the display after an acknowledgement.
    DisplayClear,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Arming => "arming",
            Self::Triggering => "triggering",
            Self::DisplayClear => "display-clear",
        })
    }
}

/// Notifications a running timer posts back to the alarm.
///
/// Timers never touch alarm state themselves. The alarm applies an event
/// only if its id is still the live timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// A countdown tick is due; `remaining` counts down to 1.
    Tick {
        id: TimerId,
        kind: TimerKind,
        remaining: u32,
    },
    /// The timer ran to completion without being cancelled.
    Elapsed { id: TimerId, kind: TimerKind },
}

impl TimerEvent {
    pub fn id(&self) -> TimerId {
        match self {
            Self::Tick { id, .. } | Self::Elapsed { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> TimerKind {
        match self {
            Self::Tick { kind, .. } | Self::Elapsed { kind, .. } => *kind,
        }
    }
}

/// Type alias for the timer event sender.
pub type TimerSender = mpsc::UnboundedSender<TimerEvent>;

/// Type alias for the timer event receiver.
pub type TimerEvents = mpsc::UnboundedReceiver<TimerEvent>;

/// Create a new timer event channel.
pub fn timer_channel() -> (TimerSender, TimerEvents) {
    mpsc::unbounded_channel()
}

struct PendingTimer {
    id: TimerId,
    kind: TimerKind,
    cancel_tx: watch::Sender<bool>,
}

/// Holds the single live timer of an alarm.
///
/// Starting a timer cancels whatever was running, so at most one timer can
/// deliver events at a time. Must be used from within a tokio runtime.
pub struct Timers {
    tx: TimerSender,
    next_id: TimerId,
    current: Option<PendingTimer>,
}

impl Timers {
    pub fn new(tx: TimerSender) -> Self {
        Self {
            tx,
            next_id: 1,
            current: None,
        }
    }

    /// Start a ticking countdown, replacing any live timer.
    pub fn start_countdown(&mut self, kind: TimerKind, policy: CountdownPolicy) -> TimerId {
        let (id, cancel_rx) = self.register(kind);
        let tx = self.tx.clone();
        tokio::spawn(run_countdown(id, kind, policy, cancel_rx, tx));
        id
    }

    /// Start a silent one-shot delay, replacing any live timer.
    pub fn start_delay(&mut self, kind: TimerKind, delay: Duration) -> TimerId {
        let (id, cancel_rx) = self.register(kind);
        let tx = self.tx.clone();
        tokio::spawn(run_delay(id, kind, delay, cancel_rx, tx));
        id
    }

    /// Cancel the live timer, if any. Returns what was cancelled.
    ///
    /// Safe to call repeatedly. Events the cancelled timer already queued
    /// are rejected by [`Timers::is_live`] from here on.
    pub fn cancel(&mut self) -> Option<TimerKind> {
        let pending = self.current.take()?;
        let _ = pending.cancel_tx.send(true);
        debug!("Cancelled {} timer #{}", pending.kind, pending.id);
        Some(pending.kind)
    }

    /// Whether `id` is the live timer.
    pub fn is_live(&self, id: TimerId) -> bool {
        self.current.as_ref().is_some_and(|p| p.id == id)
    }

    /// Forget the live timer after it elapsed naturally.
    pub fn finish(&mut self, id: TimerId) {
        if self.is_live(id) {
            self.current = None;
        }
    }

    /// Kind of the live timer.
    pub fn pending(&self) -> Option<TimerKind> {
        self.current.as_ref().map(|p| p.kind)
    }

    fn register(&mut self, kind: TimerKind) -> (TimerId, watch::Receiver<bool>) {
        self.cancel();
        let id = self.next_id;
        self.next_id += 1;
        let (cancel_tx, cancel_rx) = watch::channel(false);
        self.current = Some(PendingTimer {
            id,
            kind,
            cancel_tx,
        });
        debug!("Started {kind} timer #{id}");
        (id, cancel_rx)
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_countdown(
    id: TimerId,
    kind: TimerKind,
    policy: CountdownPolicy,
    mut cancel_rx: watch::Receiver<bool>,
    tx: TimerSender,
) {
    for remaining in (1..=policy.ticks).rev() {
        if *cancel_rx.borrow() {
            debug!("Alarm {kind} cancelled");
            return;
        }
        if tx.send(TimerEvent::Tick { id, kind, remaining }).is_err() {
            return;
        }
        tokio::select! {
            _ = sleep(policy.tick) => {}
            _ = cancel_rx.changed() => {
                debug!("Alarm {kind} cancelled");
                return;
            }
        }
    }
    let _ = tx.send(TimerEvent::Elapsed { id, kind });
}

async fn run_delay(
    id: TimerId,
    kind: TimerKind,
    delay: Duration,
    mut cancel_rx: watch::Receiver<bool>,
    tx: TimerSender,
) {
    tokio::select! {
        _ = sleep(delay) => {
            let _ = tx.send(TimerEvent::Elapsed { id, kind });
        }
        _ = cancel_rx.changed() => {}
    }
}
