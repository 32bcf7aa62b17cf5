/*
 * Responsibility
 * - Static-ish pages: landing, search form, fallback 404
 */
use axum::{extract::State, response::Html};

use crate::{error::AppError, state::AppState, views};

pub async fn home() -> Html<String> {
    Html(views::pages::home())
}

pub async fn input_page(State(state): State<AppState>) -> Html<String> {
    Html(views::pages::input(&state.enabled_diets))
}

pub async fn not_found() -> AppError {
    AppError::not_found("page")
}
