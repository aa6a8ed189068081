// MIT License - Copyright (c) 2026 Peter Wright
// Network bridge wire formats

pub mod homeassistant;
pub mod shadow;

use crate::state::AlarmSnapshot;

/// Whether anything a bridge reports differs between two snapshots.
///
/// Bridges report the alarm state and the door; display and buffer churn is
/// local to the keypad.
pub fn status_changed(previous: &AlarmSnapshot, current: &AlarmSnapshot) -> bool {
    previous.state != current.state || previous.door_is_open != current.door_is_open
}
