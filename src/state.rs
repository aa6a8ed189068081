// MIT License - Copyright (c) 2026 Peter Wright
// Alarm states and the published snapshot

use std::fmt;

use serde::{Deserialize, Serialize};

/// Alarm state machine states.
///
/// The numeric discriminants are part of the IoT shadow wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AlarmState {
    /// Initial state; the door is not watched.
    #[default]
    Disarmed = 0,
    /// Exit countdown running after a valid arm command.
    Arming = 1,
    /// Door is watched; opening it starts the entry countdown.
    Armed = 2,
    /// Entry countdown running; the alarm can still be disarmed quietly.
    Triggering = 3,
    /// The alarm is sounding.
    Triggered = 4,
}

impl AlarmState {
    /// Stable lowercase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disarmed => "disarmed",
            Self::Arming => "arming",
            Self::Armed => "armed",
            Self::Triggering => "triggering",
            Self::Triggered => "triggered",
        }
    }

    /// Numeric wire value.
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Parse a numeric wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disarmed),
            1 => Some(Self::Arming),
            2 => Some(Self::Armed),
            3 => Some(Self::Triggering),
            4 => Some(Self::Triggered),
            _ => None,
        }
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AlarmState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for AlarmState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        Self::from_u8(value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid alarm state: {value}")))
    }
}

/// Read-only view of the alarm, published after every processed event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlarmSnapshot {
    pub state: AlarmState,
    pub display: String,
    pub code: String,
    pub door_is_open: bool,
    pub failures: u32,
}
