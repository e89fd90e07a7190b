use std::time::Duration;

use thiserror::Error;

/// Errors raised while relaying readings
#[derive(Error, Debug)]
pub enum Error {
    /// An environment variable holds a value that cannot be used
    #[error("invalid value {value:?} for {key}")]
    InvalidConfig { key: &'static str, value: String },

    /// Connection, channel or consumer failure on the broker side
    #[error("broker error: {0}")]
    Broker(String),

    /// Message body does not match the reading schema
    #[error("malformed reading: {0}")]
    Decode(#[from] serde_json::Error),

    /// The storage API could not be reached
    #[error("downstream request failed: {0}")]
    Downstream(#[from] reqwest::Error),

    /// The storage API did not answer in time
    #[error("downstream request timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, Error>;
