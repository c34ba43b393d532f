use thiserror::Error;

/// Why a single provider call did not produce text.
/// The orchestrator treats every variant the same way; the detail is for logs.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("credentials missing for {0}")]
    MissingCredentials(&'static str),
    /// The request failed before a response, or the body could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("quota exhausted (status {0})")]
    QuotaExhausted(reqwest::StatusCode),
    #[error("status error: {1} (status {0})")]
    StatusCode(reqwest::StatusCode, String),
    /// The provider answered but with nothing usable (no candidate, empty text).
    #[error("empty response from {0}")]
    EmptyResponse(&'static str),
}

/// Pipeline-level failure taxonomy. None of these ever reach the caller of
/// `acquire`; they drive the fallback chain and the logs.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(#[from] ProviderError),
    #[error("malformed provider response: {reason}")]
    MalformedResponse { reason: String, raw: String },
    #[error("cache record unreadable: {0}")]
    CacheCorrupt(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
