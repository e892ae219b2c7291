use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Volatile key-value store errors.
///
/// `NotFound` covers both "never written" and "expired"; callers treat it the
/// same as an empty value.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("key not found: {key}")]
    NotFound { key: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("concurrent update on {key} did not settle after {attempts} attempts")]
    VersionConflict { key: String, attempts: u32 },

    #[error("corrupt value under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// True for a missing or expired key.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Rejections raised while validating an activation request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActivationError {
    #[error("activation request has no event codes")]
    NoEvents,

    #[error("activation request has no market codes")]
    NoMarkets,

    #[error("unknown event code: {0}")]
    UnknownEventCode(String),

    #[error("unknown market code: {0}")]
    UnknownMarketCode(String),
}

/// Broadcast transport errors.
#[derive(Error, Debug)]
pub enum BroadcastError {
    #[error("publish to {channel} rejected: {reason}")]
    Rejected { channel: String, reason: String },

    #[error("failed to encode update for {channel}: {source}")]
    Encode {
        channel: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Activation(#[from] ActivationError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_detected() {
        let err = StoreError::NotFound {
            key: "score:1".into(),
        };
        assert!(err.is_not_found());
        assert!(!StoreError::Unavailable("down".into()).is_not_found());
    }

    #[test]
    fn encode_errors_name_the_channel() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = BroadcastError::Encode {
            channel: "manutdvsarsenal_main_1x2".into(),
            source,
        }
        .into();
        assert!(err
            .to_string()
            .starts_with("failed to encode update for manutdvsarsenal_main_1x2"));
    }

    #[test]
    fn activation_errors_convert_into_crate_error() {
        let err: Error = ActivationError::UnknownEventCode("ZZ".into()).into();
        assert_eq!(err.to_string(), "unknown event code: ZZ");
    }
}
