/*
 * Responsibility
 * - Tracing init → Config load → dependency construction → Router assembly
 * - Middleware application (request id / timeout / security headers)
 * - axum::serve() with peer addresses and graceful shutdown
 */
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api::{self, extractors::TrustedProxies},
    config::Config,
    middleware,
    services::{
        cache::{CacheBackend, CacheClient},
        calories::CalorieTable,
        recipes::{RecipeApi, RecipePipeline, SpoonacularClient},
    },
    state::AppState,
};

const DEFAULT_LOG_FILTER: &str = "recipe_finder=info,tower_http=info";

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // try_init: tests may build the app more than once in one process.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

pub async fn run() -> Result<()> {
    init_tracing();

    let config = Config::from_env().context("failed to load configuration")?;
    tracing::info!(?config, "configuration loaded");

    let cache = CacheBackend::connect(config.cache_url.as_deref())
        .await
        .context("failed to connect to cache backend")?;
    tracing::info!(backend = cache.backend_name(), "cache ready");

    let api: Arc<dyn RecipeApi> = Arc::new(SpoonacularClient::new(
        &config.spoonacular_base_url,
        config.spoonacular_api_key.clone(),
        config.upstream_timeout,
    )?);

    let calories = CalorieTable::load_or_empty(&config.calories_csv_path);
    let pipeline = RecipePipeline::new(cache, api, config.pipeline_settings());
    let trusted_proxies = TrustedProxies::new(config.trusted_proxy_ips.clone());
    let state = AppState::new(
        pipeline,
        calories,
        config.enabled_diets.clone(),
        trusted_proxies,
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!(addr = %config.addr, production = config.app_env.is_production(), "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped");
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let router = api::routes().with_state(state);
    let router = middleware::http::apply(router);
    middleware::security_headers::apply(router)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
