//! Unified error types for the TTS service.

use std::path::PathBuf;

/// Main error type for TTS operations.
///
/// The first four variants are caller faults: they are contained within the
/// request that produced them and surfaced as client errors.
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    /// No text (or empty text) was supplied.
    #[error("Missing 'text' parameter")]
    MissingInput,

    /// Language code outside the supported set.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Voice id with no entry in the voice table.
    #[error("Unsupported or unavailable voice: {0}")]
    UnsupportedVoice(String),

    /// A numeric parameter that could not be converted.
    #[error("Invalid value for '{name}': {value}")]
    InvalidParameter { name: &'static str, value: String },

    /// The inference engine failed while synthesizing.
    #[error("engine failure: {0}")]
    Engine(String),

    /// A voice style asset could not be loaded.
    #[error("asset load failed for {path}: {reason}")]
    AssetLoad { path: PathBuf, reason: String },

    /// The engine could not be brought up at all.
    #[error("bootstrap failed: {0}")]
    Bootstrap(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed streaming protocol traffic.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen in normal operation).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for Results with TtsError.
pub type TtsResult<T> = Result<T, TtsError>;

impl TtsError {
    /// Create an engine failure with message.
    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }

    /// Create an invalid parameter error for the named field.
    pub fn invalid_parameter(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
        }
    }

    /// Create an asset load error.
    pub fn asset_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::AssetLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error with message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a protocol error with message.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create an internal error with message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error was caused by the caller's input rather than the service.
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            Self::MissingInput
                | Self::UnsupportedLanguage(_)
                | Self::UnsupportedVoice(_)
                | Self::InvalidParameter { .. }
        )
    }
}

impl From<serde_json::Error> for TtsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            TtsError::MissingInput.to_string(),
            "Missing 'text' parameter"
        );
        assert_eq!(
            TtsError::UnsupportedLanguage("de".into()).to_string(),
            "Unsupported language: de"
        );
        assert_eq!(
            TtsError::UnsupportedVoice("XX".into()).to_string(),
            "Unsupported or unavailable voice: XX"
        );
        assert_eq!(
            TtsError::invalid_parameter("speed", "fast").to_string(),
            "Invalid value for 'speed': fast"
        );
    }

    #[test]
    fn test_caller_fault_classification() {
        assert!(TtsError::MissingInput.is_caller_fault());
        assert!(TtsError::UnsupportedLanguage("xx".into()).is_caller_fault());
        assert!(TtsError::UnsupportedVoice("XX".into()).is_caller_fault());
        assert!(TtsError::invalid_parameter("quality", "high").is_caller_fault());

        assert!(!TtsError::engine("onnx session failed").is_caller_fault());
        assert!(!TtsError::internal("oops").is_caller_fault());
        assert!(!TtsError::Io(std::io::Error::other("disk")).is_caller_fault());
    }
}
