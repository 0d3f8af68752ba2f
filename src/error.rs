//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    AiProvider(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Terminal outcome of a session action, already phrased for the user.
    #[error("{0}")]
    Session(String),
}

pub type Result<T> = std::result::Result<T, Error>;
