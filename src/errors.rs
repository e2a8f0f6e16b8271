use std::path::PathBuf;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Durable storage failure: {0}")]
    StorageFailure(#[source] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid header: {0}")]
    InvalidHeader(#[source] http::Error),

    #[error("{0} requires a request body")]
    MissingBody(http::Method),

    #[error("{0} does not allow a request body")]
    BodyNotAllowed(http::Method),

    #[error("Cannot read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reasons a cookie cannot be encoded or a record cannot be turned back into a cookie.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Empty record")]
    Empty,

    #[error("Unsupported record version {0}")]
    UnsupportedVersion(u8),

    #[error("Record truncated while reading {0}")]
    Truncated(&'static str),

    #[error("Field {0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error("Unknown expiry tag {0}")]
    InvalidExpiryTag(u8),

    #[error("Expiry timestamp out of range")]
    InvalidTimestamp,

    #[error("Unknown flag bits {0:#04x}")]
    InvalidFlags(u8),

    #[error("Unknown SameSite value {0}")]
    InvalidSameSite(u8),

    #[error("Field {0} is longer than u32::MAX bytes")]
    FieldTooLong(&'static str),

    #[error("{0} trailing bytes after record")]
    TrailingBytes(usize),
}
