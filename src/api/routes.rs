/*
 * Responsibility
 * - URL structure of the site
 * - /, /input, /generate, /recipe/{id}, /calories, /health + 404 fallback
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::handlers::{
    calories::calories,
    health::health,
    pages::{home, input_page, not_found},
    recipes::{generate, recipe_detail},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/input", get(input_page))
        .route("/generate", post(generate))
        .route("/recipe/{id}", get(recipe_detail))
        .route("/calories", post(calories))
        .route("/health", get(health))
        .fallback(not_found)
}
