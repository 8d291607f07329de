use std::io;
use thiserror::Error;

/// Unified error type for the Aether client
#[derive(Error, Debug)]
pub enum AetherError {
    /// The responder returned a non-success status or a body we could not use
    #[error("API error: {0}")]
    Api(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// User input errors
    #[error("Input error: {0}")]
    Input(String),

    /// A transcript file failed validation
    #[error("Import error: {0}")]
    Import(String),

    /// Key-value persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// A chat request is already outstanding
    #[error("A request is already in flight")]
    RequestInFlight,

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for AetherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AetherError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            AetherError::Network(format!("Connection failed: {}", err))
        } else if err.is_status() {
            AetherError::Api(format!("API returned error status: {}", err))
        } else if err.is_decode() {
            AetherError::Api(format!("Malformed response body: {}", err))
        } else {
            AetherError::Network(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for AetherError {
    fn from(err: serde_json::Error) -> Self {
        AetherError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yml::Error> for AetherError {
    fn from(err: serde_yml::Error) -> Self {
        AetherError::Serialization(format!("YAML error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert() {
        let err: AetherError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, AetherError::Io { .. }));
        assert_eq!(err.to_string(), "IO error: gone");
    }

    #[test]
    fn json_errors_become_serialization() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: AetherError = parse.into();
        assert!(matches!(err, AetherError::Serialization(_)));
    }
}
