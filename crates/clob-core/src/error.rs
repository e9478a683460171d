//! Error types for order construction, signing and request authentication.
//!
//! Every variant is a local validation or signing failure. Nothing here is
//! retried inside the crate; retry policy belongs to the transport layer.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid key material: {message}")]
    InvalidKeyMaterial { message: String },

    #[error("Invalid order side: {0}")]
    InvalidSide(String),

    #[error("Invalid price {price} for tick size {tick_size}")]
    InvalidPrice { price: Decimal, tick_size: Decimal },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Invalid API credential secret: {message}")]
    InvalidCredentialSecret { message: String },

    #[error("Encoding error: {message}")]
    Encoding { message: String },

    #[error("Signing error: {message}")]
    Signing { message: String },

    #[error("Unsupported chain ID: {0}")]
    UnsupportedChain(u64),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn encoding(message: impl Into<String>) -> Self {
        Error::Encoding {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
