use std::fmt;

/// Everything that can go wrong in the client layer. None of these are
/// fatal: callers log them and carry on.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickerError {
    /// Request never produced a response (offline, CORS, aborted).
    Network(String),
    /// Server answered with a non-success status.
    HttpStatus(u16),
    /// Response body could not be decoded.
    Payload(String),
    /// Audio element could not be created or started.
    Audio(String),
    /// A DOM hook the template is supposed to provide is absent.
    MissingElement(&'static str),
    Config(String),
}

impl fmt::Display for ClickerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClickerError::Network(msg) => write!(f, "Network error: {}", msg),
            ClickerError::HttpStatus(code) => write!(f, "Server responded with status {}", code),
            ClickerError::Payload(msg) => write!(f, "Malformed server payload: {}", msg),
            ClickerError::Audio(msg) => write!(f, "Audio playback failed: {}", msg),
            ClickerError::MissingElement(id) => write!(f, "Element #{} not found", id),
            ClickerError::Config(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ClickerError {}

impl From<serde_json::Error> for ClickerError {
    fn from(err: serde_json::Error) -> Self {
        ClickerError::Payload(err.to_string())
    }
}
