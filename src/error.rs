/*
 * Responsibility
 * - App-wide AppError and the ValidationError raised at the form boundary
 * - IntoResponse (HTTP status + rendered error page)
 * - Translate pipeline failures into user-safe pages; upstream details stay in logs
 */
use axum::{
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

use crate::services::recipes::{Diet, PipelineError, query::QueryError};
use crate::views;

/// Bad user input. Resolved at the boundary; never reaches the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter at least one ingredient.")]
    MissingIngredients,
    #[error("The ingredient list is too long (at most {max} characters).")]
    IngredientsTooLong { max: usize },
    #[error("Too many ingredients (at most {max}).")]
    TooManyIngredients { max: usize },
    #[error("Unknown dietary filter \"{0}\".")]
    UnknownDiet(String),
    #[error("The {} filter is not available.", .0.label())]
    DietNotEnabled(Diet),
    #[error("Invalid page offset.")]
    InvalidOffset,
}

impl From<QueryError> for ValidationError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::NoIngredients => ValidationError::MissingIngredients,
            QueryError::OffsetOutOfRange(_) => ValidationError::InvalidOffset,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("rate limited")]
    RateLimited { retry_after_secs: u64 },
    #[error("upstream unavailable")]
    Upstream,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, title, message) = match &self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "Check your input", e.to_string()),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "Not found",
                format!("That {resource} could not be found."),
            ),
            AppError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "Slow down",
                "You have made too many searches. Please wait a minute and try again.".into(),
            ),
            AppError::Upstream => (
                StatusCode::BAD_GATEWAY,
                "Recipe service unavailable",
                "We could not reach the recipe service. Please try again shortly.".into(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong",
                "An unexpected error occurred.".into(),
            ),
        };

        // Server-side failures get a reference the user can quote; the same id is logged.
        let reference = status.is_server_error().then(Uuid::new_v4);
        if let Some(reference) = reference {
            tracing::error!(%reference, status = status.as_u16(), error = %self, "request failed");
        }

        let body = views::errors::page(status, title, &message, reference);
        let mut response = (status, Html(body)).into_response();

        if let AppError::RateLimited { retry_after_secs } = self
            && let Ok(v) = HeaderValue::from_str(&retry_after_secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, v);
        }

        response
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::RateLimited { retry_after } => AppError::RateLimited {
                retry_after_secs: retry_after.as_secs().max(1),
            },
            PipelineError::NotFound { .. } => AppError::not_found("recipe"),
            PipelineError::Upstream(_) => AppError::Upstream,
            PipelineError::Store(_) => AppError::Internal,
        }
    }
}
