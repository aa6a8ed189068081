// MIT License - Copyright (c) 2026 Peter Wright
// Home Assistant MQTT alarm panel and door sensor

use serde::{Deserialize, Serialize};

use crate::error::{AlarmError, Result};
use crate::service::RemoteRequest;
use crate::state::AlarmState;

/// Availability payload for both entities.
pub const ONLINE: &str = "online";

/// Door sensor payload when open.
pub const DOOR_OPEN: &str = "payload_on";

/// Door sensor payload when closed.
pub const DOOR_CLOSED: &str = "payload_off";

/// Topics the bridge publishes and subscribes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    /// Inbound control messages
    pub control: String,
    /// Retained alarm state
    pub alarm_state: String,
    /// Retained door state
    pub door_state: String,
    pub alarm_availability: String,
    pub door_availability: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            control: "home-assistant/alarm/control".to_string(),
            alarm_state: "home-assistant/alarm/contact".to_string(),
            door_state: "home-assistant/door/contact".to_string(),
            alarm_availability: "home-assistant/alarm/availability".to_string(),
            door_availability: "home-assistant/door/availability".to_string(),
        }
    }
}

/// Home Assistant alarm panel state for an alarm state.
///
/// The alarm has a single armed mode, reported as `armed_home`. The entry
/// countdown is Home Assistant's `pending`.
pub fn alarm_payload(state: AlarmState) -> &'static str {
    match state {
        AlarmState::Disarmed => "disarmed",
        AlarmState::Arming => "arming",
        AlarmState::Armed => "armed_home",
        AlarmState::Triggering => "pending",
        AlarmState::Triggered => "triggered",
    }
}

/// Door sensor payload.
pub fn door_payload(open: bool) -> &'static str {
    if open { DOOR_OPEN } else { DOOR_CLOSED }
}

/// Inbound control message: `{"action": "ARM_AWAY", "code": "1234"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMessage {
    pub action: String,
    #[serde(default)]
    pub code: String,
}

impl ControlMessage {
    /// Decode a control payload.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Turn the message into a request, provided it carries the live code.
    pub fn authorize(&self, code: &str) -> Result<RemoteRequest> {
        if self.code != code {
            return Err(AlarmError::control(format!(
                "{} rejected: incorrect code",
                self.action
            )));
        }
        match self.action.as_str() {
            "ARM_HOME" | "ARM_AWAY" => Ok(RemoteRequest::Arming),
            "DISARM" => Ok(RemoteRequest::Disarm),
            "TRIGGER" => Ok(RemoteRequest::Trigger),
            other => Err(AlarmError::control(format!("unknown action: {other}"))),
        }
    }
}
