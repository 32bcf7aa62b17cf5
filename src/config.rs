/*
 * Responsibility
 * - Read environment / .env once at startup (API key, TTLs, rate limit, cache URL)
 * - Validate values (fail startup when missing or malformed)
 */
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::services::cache::ttl_seconds;
use crate::services::rate_limit::RateLimitPolicy;
use crate::services::recipes::{Diet, PipelineSettings, spoonacular::DEFAULT_BASE_URL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub spoonacular_api_key: String,
    pub spoonacular_base_url: String,
    pub upstream_timeout: Duration,

    pub search_cache_ttl: Duration,
    pub detail_cache_ttl: Duration,
    pub rate_limit_max_requests: u64,
    pub rate_limit_window: Duration,

    /// Valkey/Redis URL; in-process cache when unset.
    pub cache_url: Option<String>,

    pub enabled_diets: Vec<Diet>,
    pub calories_csv_path: PathBuf,

    // Peers allowed to report the client address via X-Forwarded-For.
    // Empty means the header is ignored.
    pub trusted_proxy_ips: Vec<IpAddr>,
}

// Keep the API key out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("spoonacular_base_url", &self.spoonacular_base_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("search_cache_ttl", &self.search_cache_ttl)
            .field("detail_cache_ttl", &self.detail_cache_ttl)
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window", &self.rate_limit_window)
            .field("cache_url", &self.cache_url.as_ref().map(|_| "<set>"))
            .field("enabled_diets", &self.enabled_diets)
            .field("calories_csv_path", &self.calories_csv_path)
            .field("trusted_proxy_ips", &self.trusted_proxy_ips)
            .finish_non_exhaustive()
    }
}

/// Optional numeric variable: unset → default, set but unparseable → error.
fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        _ => Ok(default),
    }
}

fn non_empty_var(key: &'static str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Comma-separated diet list; all diets when unset.
pub fn parse_diets(raw: Option<&str>) -> Result<Vec<Diet>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(Diet::ALL.to_vec());
    };

    let mut diets = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Diet>().map_err(|_| ConfigError::Invalid("ENABLED_DIETS")))
        .collect::<Result<Vec<_>, _>>()?;
    diets.sort();
    diets.dedup();
    Ok(diets)
}

/// Comma-separated IP list; empty when unset.
pub fn parse_trusted_proxies(raw: Option<&str>) -> Result<Vec<IpAddr>, ConfigError> {
    let mut ips = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<IpAddr>().map_err(|_| ConfigError::Invalid("TRUSTED_PROXY_IPS")))
        .collect::<Result<Vec<_>, _>>()?;
    ips.sort();
    ips.dedup();
    Ok(ips)
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = parse_or("PORT", 3000)?;

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let spoonacular_api_key = non_empty_var("SPOONACULAR_API_KEY")
            .ok_or(ConfigError::Missing("SPOONACULAR_API_KEY"))?;

        let spoonacular_base_url =
            non_empty_var("SPOONACULAR_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let upstream_timeout_seconds: u64 = parse_or("UPSTREAM_TIMEOUT_SECONDS", 10)?;
        if upstream_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("UPSTREAM_TIMEOUT_SECONDS"));
        }

        let search_cache_ttl = ttl_seconds(parse_or("SEARCH_CACHE_TTL_SECONDS", 30 * 60)?);
        let detail_cache_ttl = ttl_seconds(parse_or("DETAIL_CACHE_TTL_SECONDS", 60 * 60)?);

        let rate_limit_max_requests = parse_or("RATE_LIMIT_MAX_REQUESTS", 10)?;
        let rate_limit_window_seconds: u64 = parse_or("RATE_LIMIT_WINDOW_SECONDS", 60)?;
        if rate_limit_window_seconds == 0 {
            return Err(ConfigError::Invalid("RATE_LIMIT_WINDOW_SECONDS"));
        }

        let cache_url = non_empty_var("CACHE_URL");

        let enabled_diets = parse_diets(non_empty_var("ENABLED_DIETS").as_deref())?;

        let calories_csv_path = non_empty_var("CALORIES_CSV_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("data/calories.csv"));

        let trusted_proxy_ips =
            parse_trusted_proxies(non_empty_var("TRUSTED_PROXY_IPS").as_deref())?;

        Ok(Self {
            addr,
            app_env,
            spoonacular_api_key,
            spoonacular_base_url,
            upstream_timeout: ttl_seconds(upstream_timeout_seconds),
            search_cache_ttl,
            detail_cache_ttl,
            rate_limit_max_requests,
            rate_limit_window: ttl_seconds(rate_limit_window_seconds),
            cache_url,
            enabled_diets,
            calories_csv_path,
            trusted_proxy_ips,
        })
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            search_ttl: self.search_cache_ttl,
            detail_ttl: self.detail_cache_ttl,
            rate_limit: RateLimitPolicy {
                max_requests: self.rate_limit_max_requests,
                window: self.rate_limit_window,
            },
        }
    }
}
