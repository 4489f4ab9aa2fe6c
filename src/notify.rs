use serde::Serialize;

/// Short-lived message shown to the user, red for errors and green otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub is_error: bool,
    pub duration_ms: u64,
}

impl Notification {
    pub fn success(message: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            message: message.into(),
            is_error: false,
            duration_ms,
        }
    }

    pub fn error(message: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            message: message.into(),
            is_error: true,
            duration_ms,
        }
    }
}
