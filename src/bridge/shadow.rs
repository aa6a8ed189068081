// MIT License - Copyright (c) 2026 Peter Wright
// IoT device shadow documents

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::service::RemoteRequest;
use crate::state::{AlarmSnapshot, AlarmState};

/// Device status as it appears in the shadow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    #[serde(default)]
    pub door_is_open: bool,
    pub alarm_state: AlarmState,
}

impl From<&AlarmSnapshot> for DeviceStatus {
    fn from(snapshot: &AlarmSnapshot) -> Self {
        Self {
            door_is_open: snapshot.door_is_open,
            alarm_state: snapshot.state,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired: Option<DeviceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported: Option<DeviceStatus>,
}

/// `{"state": {"desired": ..., "reported": ...}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowDocument {
    pub state: ShadowState,
}

impl ShadowDocument {
    /// An update reporting the device's current status.
    pub fn reported(status: DeviceStatus) -> Self {
        Self {
            state: ShadowState {
                desired: None,
                reported: Some(status),
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Topic the device publishes reported state to.
pub fn update_topic(thing_name: &str) -> String {
    format!("$aws/things/{}/shadow/update", escape_path_segment(thing_name))
}

/// Topic carrying accepted shadow updates, including desired state.
pub fn accepted_topic(thing_name: &str) -> String {
    format!("{}/accepted", update_topic(thing_name))
}

/// Extract the remote request from an accepted shadow update.
///
/// Returns `Ok(None)` for documents without a desired section, such as the
/// echo of the device's own reported update.
pub fn desired_request(payload: &[u8]) -> Result<Option<RemoteRequest>> {
    let doc: ShadowDocument = serde_json::from_slice(payload)?;
    Ok(doc
        .state
        .desired
        .map(|desired| RemoteRequest::towards(desired.alarm_state)))
}

/// Percent-encode a string for use as one topic path segment.
fn escape_path_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'~'
            | b'$'
            | b'&'
            | b'+'
            | b'='
            | b':'
            | b'@' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
