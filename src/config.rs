// MIT License - Copyright (c) 2026 Peter Wright
// Alarm configuration

use std::time::Duration;

use crate::error::{AlarmError, Result};

/// How a timed transition counts down.
///
/// Each tick beeps and shows the remaining count, then waits `tick`.
/// The expiry action runs after the last wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownPolicy {
    pub ticks: u32,
    pub tick: Duration,
}

impl CountdownPolicy {
    pub fn new(ticks: u32, tick: Duration) -> Self {
        Self { ticks, tick }
    }

    /// Total time from start to expiry.
    pub fn total(&self) -> Duration {
        self.tick * self.ticks
    }
}

impl Default for CountdownPolicy {
    fn default() -> Self {
        Self {
            ticks: 10,
            tick: Duration::from_secs(1),
        }
    }
}

/// Configuration for an [`Alarm`](crate::Alarm).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmConfig {
    /// Initial secret code (digits only)
    pub code: String,
    /// Exit countdown, from a valid arm command to armed
    pub arming: CountdownPolicy,
    /// Entry countdown, from the door opening to the siren
    pub triggering: CountdownPolicy,
    /// How long `Armd` / `disa` stay on the display
    pub display_clear_delay: Duration,
    /// Capacity of the command queue in front of the alarm service
    pub command_queue: usize,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            code: "1234".to_string(),
            arming: CountdownPolicy::default(),
            triggering: CountdownPolicy::default(),
            display_clear_delay: Duration::from_secs(5),
            command_queue: 64,
        }
    }
}

impl AlarmConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> AlarmConfigBuilder {
        AlarmConfigBuilder::default()
    }

    /// Check the values the alarm relies on.
    pub fn validate(&self) -> Result<()> {
        if self.code.is_empty() {
            return Err(AlarmError::config("code must not be empty"));
        }
        if !self.code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AlarmError::config("code must contain only digits"));
        }
        if self.arming.ticks == 0 || self.triggering.ticks == 0 {
            return Err(AlarmError::config("countdowns need at least one tick"));
        }
        if self.command_queue == 0 {
            return Err(AlarmError::config("command queue capacity must be positive"));
        }
        Ok(())
    }
}

/// Builder for AlarmConfig.
#[derive(Debug, Clone, Default)]
pub struct AlarmConfigBuilder {
    config: AlarmConfig,
}

impl AlarmConfigBuilder {
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.config.code = code.into();
        self
    }

    /// Use the same policy for the exit and entry countdowns.
    pub fn countdown(mut self, policy: CountdownPolicy) -> Self {
        self.config.arming = policy;
        self.config.triggering = policy;
        self
    }

    pub fn arming(mut self, policy: CountdownPolicy) -> Self {
        self.config.arming = policy;
        self
    }

    pub fn triggering(mut self, policy: CountdownPolicy) -> Self {
        self.config.triggering = policy;
        self
    }

    pub fn display_clear_delay(mut self, delay: Duration) -> Self {
        self.config.display_clear_delay = delay;
        self
    }

    pub fn command_queue(mut self, capacity: usize) -> Self {
        self.config.command_queue = capacity;
        self
    }

    pub fn build(self) -> AlarmConfig {
        self.config
    }
}
