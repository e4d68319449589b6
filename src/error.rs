// Typed errors with thiserror. Only the JSON and storage boundaries can fail;
// state setters and per-frame integrators are total.

use thiserror::Error;

/// Engine error types.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Unknown easter egg: {0}")]
    UnknownEgg(String),

    #[error("Storage error for key {key}: {message}")]
    Storage { key: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EngineError::InvalidConfig("missing field".to_string());
        assert!(err.to_string().contains("missing field"));

        let err = EngineError::Storage {
            key: "unlocked".to_string(),
            message: "quota".to_string(),
        };
        assert_eq!(err.to_string(), "Storage error for key unlocked: quota");
    }

    #[test]
    fn from_serde_error() {
        let err: EngineError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, EngineError::Serialization(_)));
    }
}
