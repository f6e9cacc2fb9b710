//! Shared error type across ingestor crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Missing or malformed input.
    BadRequest,
    /// Payload too large.
    PayloadTooLarge,
    /// Uploaded content could not be decoded.
    DecodeFailed,
    /// External collaborator failed while processing.
    UpstreamFailed,
    /// External collaborator did not answer in time.
    UpstreamTimeout,
    /// Sentiment analysis rejected the input.
    AnalysisFailed,
    /// Invalid configuration at startup.
    Config,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and error bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ClientCode::DecodeFailed => "DECODE_FAILED",
            ClientCode::UpstreamFailed => "UPSTREAM_FAILED",
            ClientCode::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            ClientCode::AnalysisFailed => "ANALYSIS_FAILED",
            ClientCode::Config => "CONFIG",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0}")]
    Validation(String),
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("analysis failed: {0}")]
    Analysis(String),
    #[error("upstream timeout: {0}")]
    UpstreamTimeout(String),

    #[error("duplicate metric series: {0}")]
    DuplicateSeries(String),
    #[error("unknown metric series: {0}")]
    UnknownSeries(String),
    #[error("label mismatch on {series}: expected {expected:?}, got {got:?}")]
    LabelMismatch {
        series: String,
        expected: Vec<String>,
        got: Vec<String>,
    },
    #[error("invalid metric series: {0}")]
    InvalidSeries(String),
    #[error("invalid buckets: {0}")]
    InvalidBuckets(String),
    #[error("invalid observation: {0}")]
    InvalidObservation(String),

    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl IngestError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            IngestError::Validation(_) => ClientCode::BadRequest,
            IngestError::PayloadTooLarge => ClientCode::PayloadTooLarge,
            IngestError::Decode(_) => ClientCode::DecodeFailed,
            IngestError::Inference(_) => ClientCode::UpstreamFailed,
            IngestError::Analysis(_) => ClientCode::AnalysisFailed,
            IngestError::UpstreamTimeout(_) => ClientCode::UpstreamTimeout,
            IngestError::Config(_) => ClientCode::Config,
            IngestError::DuplicateSeries(_)
            | IngestError::UnknownSeries(_)
            | IngestError::LabelMismatch { .. }
            | IngestError::InvalidSeries(_)
            | IngestError::InvalidBuckets(_)
            | IngestError::InvalidObservation(_)
            | IngestError::Internal(_) => ClientCode::Internal,
        }
    }

    /// True for metrics-registry misuse, which only a wiring bug can cause.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            IngestError::DuplicateSeries(_)
                | IngestError::UnknownSeries(_)
                | IngestError::LabelMismatch { .. }
                | IngestError::InvalidSeries(_)
                | IngestError::InvalidBuckets(_)
                | IngestError::InvalidObservation(_)
        )
    }
}
