// MIT License - Copyright (c) 2026 Peter Wright
// Keypad alarm state machine

use tracing::{debug, info, warn};

use crate::command::{parse_command, Command};
use crate::config::AlarmConfig;
use crate::hooks::AlarmHooks;
use crate::keypad::{self, Tone};
use crate::state::{AlarmSnapshot, AlarmState};
use crate::timer::{timer_channel, TimerEvent, TimerEvents, TimerKind, Timers};

/// Display text while armed.
pub const DISPLAY_ARMED: &str = "Armd";

/// Display text after a disarm.
pub const DISPLAY_DISARMED: &str = "disa";

/// Display text while the siren sounds.
pub const DISPLAY_ALARM: &str = "Alrm";

/// The alarm state machine.
///
/// `Alarm` is a plain single-owner value: every operation takes `&mut self`
/// and returns once its effects are applied. Countdowns run as background
/// tasks that only post [`TimerEvent`]s; whoever owns the alarm feeds them
/// back through [`Alarm::on_timer`]. [`AlarmService`](crate::AlarmService)
/// does exactly that on a dedicated task.
///
/// Must be created and driven inside a tokio runtime.
///
/// # Example
///
/// ```no_run
/// use keypad_alarm::{Alarm, AlarmConfig, AlarmState, NoopHooks};
///
/// #[tokio::main]
/// async fn main() {
///     let config = AlarmConfig::builder().code("1234").build();
///     let (mut alarm, mut timer_events) = Alarm::new(config, NoopHooks);
///
///     for key in "A1234#".chars() {
///         alarm.key_pressed(key);
///     }
///     assert_eq!(alarm.state(), AlarmState::Arming);
///
///     while let Some(event) = timer_events.recv().await {
///         alarm.on_timer(event);
///         if alarm.state() == AlarmState::Armed {
///             break;
///         }
///     }
/// }
/// ```
pub struct Alarm<H: AlarmHooks> {
    state: AlarmState,
    code: String,
    buffer: String,
    display: String,
    door_is_open: bool,
    /// Reserved for a lockout after repeated bad codes; nothing increments it.
    failures: u32,
    hooks: H,
    config: AlarmConfig,
    timers: Timers,
}

impl<H: AlarmHooks> Alarm<H> {
    /// Create a disarmed alarm. The returned receiver carries countdown
    /// events that must be passed to [`Alarm::on_timer`].
    pub fn new(config: AlarmConfig, hooks: H) -> (Self, TimerEvents) {
        let (tx, rx) = timer_channel();
        let alarm = Self {
            state: AlarmState::Disarmed,
            code: config.code.clone(),
            buffer: String::new(),
            display: String::new(),
            door_is_open: false,
            failures: 0,
            hooks,
            config,
            timers: Timers::new(tx),
        };
        (alarm, rx)
    }

    // --- Accessors ---

    pub fn state(&self) -> AlarmState {
        self.state
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn door_is_open(&self) -> bool {
        self.door_is_open
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Kind of the countdown or delay currently running, if any.
    pub fn pending_timer(&self) -> Option<TimerKind> {
        self.timers.pending()
    }

    pub fn snapshot(&self) -> AlarmSnapshot {
        AlarmSnapshot {
            state: self.state,
            display: self.display.clone(),
            code: self.code.clone(),
            door_is_open: self.door_is_open,
            failures: self.failures,
        }
    }

    /// Force the state without running any entry action.
    ///
    /// Used to start the machine somewhere other than disarmed, mainly in
    /// tests. Cancels the live timer.
    pub fn set_state(&mut self, state: AlarmState) {
        self.timers.cancel();
        self.state = state;
    }

    // --- Input ---

    /// Handle one keypad symbol.
    pub fn key_pressed(&mut self, key: char) {
        if key == keypad::BACKSPACE {
            self.beep(Tone::Medium);
            self.buffer.pop();
            self.display.clone_from(&self.buffer);
            return;
        }
        if let Some(tone) = keypad::key_tone(key) {
            self.beep(tone);
        }
        if key == keypad::CLEAR {
            debug!("Clearing buffer");
            self.buffer.clear();
            self.display.clear();
            return;
        }
        self.buffer.push(key);
        self.display.clone_from(&self.buffer);
        if key == keypad::ENTER {
            debug!("Attempting to execute command");
            self.beep(Tone::Medium);
            let entered = std::mem::take(&mut self.buffer);
            self.execute(&entered);
            // Leave the display alone if the command put something on it
            if self.display == entered {
                self.display.clear();
            }
        }
    }

    /// Record a door sensor sample. Only edges have an effect.
    pub fn set_door_is_open(&mut self, open: bool) {
        if self.door_is_open == open {
            return;
        }
        self.door_is_open = open;
        debug!("Door {}", if open { "opened" } else { "closed" });
        if open && self.state == AlarmState::Armed {
            info!("Triggering alarm due to door open");
            self.triggering();
        }
    }

    fn execute(&mut self, entered: &str) {
        match parse_command(entered) {
            Some(Command::Arm { code }) => {
                if code == self.code {
                    info!("Arming the alarm");
                    self.arming();
                } else {
                    warn!("Arm command with incorrect code ignored");
                }
            }
            Some(Command::ChangeCode { current, new }) => {
                if self.state != AlarmState::Disarmed {
                    debug!("Code change ignored while {}", self.state);
                    return;
                }
                if current != self.code {
                    warn!("The entered code was not correct, code unchanged");
                    return;
                }
                self.code = new;
                info!("Changed the alarm code");
                self.beep(Tone::Low);
                self.beep(Tone::Medium);
                self.beep(Tone::High);
            }
            Some(Command::Disarm { code }) => {
                if code == self.code {
                    info!("Disarming");
                    self.disarm();
                } else {
                    warn!("Disarm command with incorrect code ignored");
                }
            }
            None => debug!("Unrecognised command"),
        }
    }

    // --- Transitions ---

    /// Enter the armed state.
    pub fn arm(&mut self) {
        self.state = AlarmState::Armed;
        info!("Armed");
        self.display = DISPLAY_ARMED.to_string();
        self.schedule_display_clear();
    }

    /// Cancel any countdown, silence the siren and return to disarmed.
    ///
    /// Runs in full even when already disarmed.
    pub fn disarm(&mut self) {
        if let Some(kind) = self.timers.cancel() {
            info!("Alarm {kind} cancelled");
        }
        self.hooks.stop_sound();
        self.state = AlarmState::Disarmed;
        info!("Alarm disarmed");
        self.display = DISPLAY_DISARMED.to_string();
        self.schedule_display_clear();
    }

    /// Start the exit countdown. Only allowed from disarmed.
    pub fn arming(&mut self) {
        if self.state != AlarmState::Disarmed {
            warn!(
                "Attempted to arm while state was not disarmed, current state is {}",
                self.state
            );
            return;
        }
        self.state = AlarmState::Arming;
        let policy = self.config.arming;
        self.timers.start_countdown(TimerKind::Arming, policy);
    }

    /// Start the entry countdown.
    pub fn triggering(&mut self) {
        if matches!(self.state, AlarmState::Triggering | AlarmState::Triggered) {
            debug!("Already {}, not restarting the entry countdown", self.state);
            return;
        }
        info!("Triggering alarm");
        self.state = AlarmState::Triggering;
        let policy = self.config.triggering;
        self.timers.start_countdown(TimerKind::Triggering, policy);
    }

    /// Sound the alarm.
    pub fn trigger(&mut self) {
        self.timers.cancel();
        info!("Alarm triggered");
        self.state = AlarmState::Triggered;
        self.display = DISPLAY_ALARM.to_string();
        self.hooks.start_sound();
    }

    // --- Timers ---

    /// Apply an event posted by a countdown. Events from cancelled or
    /// replaced timers are dropped.
    pub fn on_timer(&mut self, event: TimerEvent) {
        if !self.timers.is_live(event.id()) {
            debug!("Dropping stale {} timer event", event.kind());
            return;
        }
        match event {
            TimerEvent::Tick { remaining, .. } => {
                self.beep(Tone::Medium);
                self.display = remaining.to_string();
            }
            TimerEvent::Elapsed { id, kind } => {
                self.timers.finish(id);
                match kind {
                    TimerKind::Arming => self.arm(),
                    TimerKind::Triggering => self.trigger(),
                    TimerKind::DisplayClear => self.display.clear(),
                }
            }
        }
    }

    fn schedule_display_clear(&mut self) {
        let delay = self.config.display_clear_delay;
        self.timers.start_delay(TimerKind::DisplayClear, delay);
    }

    fn beep(&mut self, tone: Tone) {
        match tone {
            Tone::Low => self.hooks.low_beep(),
            Tone::Medium => self.hooks.medium_beep(),
            Tone::High => self.hooks.high_beep(),
        }
    }
}
