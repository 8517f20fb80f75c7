//! Error types for extraction and for the runtime that drives it.

use std::fmt;

/// Which half of a raw row failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    /// The upstream API response stored in `data`
    Response,
    /// The job reference stored in `input`
    Context,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeStage::Response => write!(f, "response"),
            DecodeStage::Context => write!(f, "context"),
        }
    }
}

/// Failure of the per-row transform.
///
/// Decoding is the only way a row can fail; sparse but well-formed payloads
/// always extract.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("failed to decode {stage}: {source}")]
    Decode {
        stage: DecodeStage,
        #[source]
        source: serde_json::Error,
    },
}

impl ExtractError {
    pub fn decode(stage: DecodeStage, source: serde_json::Error) -> Self {
        ExtractError::Decode { stage, source }
    }

    pub fn stage(&self) -> DecodeStage {
        match self {
            ExtractError::Decode { stage, .. } => *stage,
        }
    }
}

/// Errors raised by the extraction runtime (sources, sinks, configuration).
#[derive(thiserror::Error, Debug)]
pub enum RunnerError {
    /// A row failed and the runner was configured to abort
    #[error("raw row {row_id} failed: {source}")]
    Extract {
        row_id: u64,
        #[source]
        source: ExtractError,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("worker pool error: {0}")]
    WorkerPool(String),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Database(#[from] diesel::result::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Pool(#[from] r2d2::Error),
}

/// Error type for record writers
#[derive(thiserror::Error, Debug)]
pub enum SerializationError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
