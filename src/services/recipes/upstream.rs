//! Seam between the pipeline and the third-party recipe API.
use async_trait::async_trait;
use thiserror::Error;

use super::query::SearchQuery;
use super::transform::{RawRecipeInformation, RawSearchResponse};

/// Failures talking to the upstream API.
///
/// Messages never carry upstream response bodies; they end up in logs only.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request timed out")]
    Timeout,
    #[error("upstream transport error: {0}")]
    Transport(String),
    #[error("upstream returned status {status}")]
    Status { status: u16 },
    #[error("upstream payload could not be decoded: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpstreamError::Status { status: 404 })
    }

    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Timeout => "timeout",
            UpstreamError::Transport(_) => "transport",
            UpstreamError::Status { .. } => "status",
            UpstreamError::Decode(_) => "decode",
        }
    }
}

/// The recipe API as the pipeline sees it.
///
/// Implementations must bound every call with a timeout.
#[async_trait]
pub trait RecipeApi: Send + Sync + 'static {
    // Upstream name (for logging).
    fn name(&self) -> &'static str;

    async fn search(&self, query: &SearchQuery) -> Result<RawSearchResponse, UpstreamError>;

    async fn information(&self, id: u64) -> Result<RawRecipeInformation, UpstreamError>;
}
