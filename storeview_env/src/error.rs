//! Error types for the StoreView record store abstraction.

use thiserror::Error;

/// Errors raised by record stores and frame decoders.
///
/// The engines never retry; these propagate unchanged to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading a dump or backing file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document did not match its expected shape
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store rejected or failed a query
    #[error("Query error: {0}")]
    Query(String),

    /// A frame payload could not be decoded into an image
    #[error("Decode error: {0}")]
    Decode(#[from] image::ImageError),
}

impl StoreError {
    /// Creates a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }
}
