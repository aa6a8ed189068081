// MIT License - Copyright (c) 2026 Peter Wright
// Keypad alarm controller

/// All errors that can occur in the keypad-alarm library.
///
/// The alarm core itself never fails: wrong codes, malformed commands and
/// redundant requests are absorbed and logged. These errors cover the
/// surfaces around it (the actor channel, configuration and the wire).
#[derive(Debug, thiserror::Error)]
pub enum AlarmError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Invalid control message: {reason}")]
    InvalidControl { reason: String },

    #[error("Alarm service stopped")]
    ChannelClosed,
}

impl AlarmError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        AlarmError::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub(crate) fn control(reason: impl Into<String>) -> Self {
        AlarmError::InvalidControl {
            reason: reason.into(),
        }
    }

    /// Whether the error means the alarm service is gone and the caller
    /// should stop feeding it events.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, AlarmError::ChannelClosed)
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for AlarmError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        AlarmError::ChannelClosed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for AlarmError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        AlarmError::ChannelClosed
    }
}

pub type Result<T> = std::result::Result<T, AlarmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            AlarmError::config("code must not be empty").to_string(),
            "Invalid configuration: code must not be empty"
        );
        assert_eq!(AlarmError::ChannelClosed.to_string(), "Alarm service stopped");
    }

    #[test]
    fn test_is_shutdown() {
        assert!(AlarmError::ChannelClosed.is_shutdown());
        assert!(!AlarmError::control("bad").is_shutdown());
    }
}
