/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 *   - recipe pipeline (cache + rate limiter + upstream), calorie table, enabled diets
 *   - trusted proxies for client identification
 * - Clone is cheap (everything behind Arc)
 */
use std::sync::Arc;

use axum::extract::FromRef;

use crate::api::extractors::TrustedProxies;
use crate::services::{
    cache::CacheBackend,
    calories::CalorieTable,
    recipes::{Diet, RecipePipeline},
};

#[derive(Clone, Debug)]
pub struct AppState {
    pub pipeline: Arc<RecipePipeline<CacheBackend>>,
    pub calories: Arc<CalorieTable>,
    pub enabled_diets: Arc<[Diet]>,
    pub trusted_proxies: TrustedProxies,
}

impl AppState {
    pub fn new(
        pipeline: RecipePipeline<CacheBackend>,
        calories: CalorieTable,
        enabled_diets: Vec<Diet>,
        trusted_proxies: TrustedProxies,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            calories: Arc::new(calories),
            enabled_diets: enabled_diets.into(),
            trusted_proxies,
        }
    }
}

impl FromRef<AppState> for TrustedProxies {
    fn from_ref(state: &AppState) -> Self {
        state.trusted_proxies.clone()
    }
}
