//! Error handling - one hierarchy for the whole pipeline

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// treasury-tx error hierarchy
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File IO errors (input feeds and output sinks)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed external line record
    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed fractional price string
    #[error("Invalid fractional price: {0:?}")]
    InvalidPrice(String),

    /// Instrument not present in the bond master
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    /// Reference value (e.g. PV01 rate) missing for a known instrument
    #[error("Missing reference data for {instrument}: {field}")]
    MissingReferenceData { instrument: String, field: &'static str },

    /// Quote/reject addressed to an inquiry that was never ingested
    #[error("Unknown inquiry: {0}")]
    UnknownInquiry(String),

    /// Best bid/offer requested on a book with an empty side
    #[error("Empty {side} stack for {instrument}")]
    EmptyBook { instrument: String, side: &'static str },

    /// Quantity arithmetic left the i64 range
    #[error("Quantity overflow: {0}")]
    QuantityOverflow(String),

    /// A store was updated while it was still notifying its listeners
    #[error("Cyclic propagation detected in store {0}")]
    CyclicPropagation(&'static str),

    /// Serialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
