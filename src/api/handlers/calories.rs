/*
 * Responsibility
 * - POST /calories: ingredient list → per-100g energy breakdown page
 */
use axum::{Form, extract::State, response::Html};

use crate::{api::dto::forms::CaloriesForm, error::AppError, state::AppState, views};

pub async fn calories(
    State(state): State<AppState>,
    Form(form): Form<CaloriesForm>,
) -> Result<Html<String>, AppError> {
    let items = form.validate()?;
    let report = state.calories.report(&items);

    Ok(Html(views::calories::report(&report)))
}
