/*
 * Responsibility
 * - POST /generate: form → validate → pipeline.search → results page
 * - GET /recipe/{id}: pipeline.get_detail → detail page
 * - Failures become AppError; this is the only place pipeline results meet HTTP
 */
use axum::{
    Form,
    extract::{Path, State},
    response::Html,
};

use crate::{
    api::{dto::forms::GenerateForm, extractors::ClientId},
    error::AppError,
    state::AppState,
    views,
};

pub async fn generate(
    State(state): State<AppState>,
    client: ClientId,
    Form(form): Form<GenerateForm>,
) -> Result<Html<String>, AppError> {
    let query = form.validate(&state.enabled_diets)?;

    let collection = state.pipeline.search(client.as_str(), &query).await?;

    Ok(Html(views::recipes::results(&query, &collection)))
}

pub async fn recipe_detail(
    State(state): State<AppState>,
    client: ClientId,
    Path(raw_id): Path<String>,
) -> Result<Html<String>, AppError> {
    // Non-numeric ids cannot exist upstream.
    let id: u64 = raw_id
        .parse()
        .map_err(|_| AppError::not_found("recipe"))?;

    let detail = state.pipeline.get_detail(client.as_str(), id).await?;

    Ok(Html(views::recipes::detail(&detail)))
}
