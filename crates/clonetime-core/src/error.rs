//! Caller-facing error taxonomy.
//!
//! Only bad input and store lookup failures reach the caller. Crawl and
//! model failures are absorbed inside the pipeline and degrade to a
//! fallback estimate, so they have no variant here.

use thiserror::Error;

/// Rejected request input. Client-facing, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("URL and tier are required")]
    MissingFields,
    #[error("Invalid URL format")]
    InvalidUrl,
    #[error("Invalid tier. Must be speedrun, mvp, or prod-lite")]
    InvalidTier,
}

/// Failure of a top-level pipeline operation.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("store error: {0:#}")]
    Store(anyhow::Error),
}

impl AnalyzeError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, AnalyzeError::Validation(_))
    }
}
