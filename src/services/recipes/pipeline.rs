/*
 * Responsibility
 * - cache check → rate slot reservation → upstream call → transform → store
 * - Returns typed failures; never writes a response
 * - At most one upstream call in flight per cache key
 */
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use super::models::{RecipeCollection, RecipeDetail};
use super::query::{CacheKey, SearchQuery};
use super::transform;
use super::upstream::{RecipeApi, UpstreamError};
use crate::services::cache::{CacheClient, CacheError};
use crate::services::key_lock::KeyedLocks;
use crate::services::rate_limit::{RateLimitPolicy, RateLimiter};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("rate limit exceeded")]
    RateLimited { retry_after: Duration },
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("recipe {id} not found upstream")]
    NotFound { id: u64 },
    #[error("rate limit store unavailable: {0}")]
    Store(#[from] CacheError),
}

impl PipelineError {
    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::RateLimited { .. } => "rate_limited",
            PipelineError::Upstream(e) => e.kind(),
            PipelineError::NotFound { .. } => "not_found",
            PipelineError::Store(_) => "store",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    pub search_ttl: Duration,
    pub detail_ttl: Duration,
    pub rate_limit: RateLimitPolicy,
}

pub struct RecipePipeline<C: CacheClient> {
    cache: C,
    api: Arc<dyn RecipeApi>,
    limiter: RateLimiter<C>,
    locks: KeyedLocks,
    search_ttl: Duration,
    detail_ttl: Duration,
}

impl<C: CacheClient> std::fmt::Debug for RecipePipeline<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipePipeline")
            .field("cache", &self.cache.backend_name())
            .field("api", &self.api.name())
            .field("search_ttl", &self.search_ttl)
            .field("detail_ttl", &self.detail_ttl)
            .finish_non_exhaustive()
    }
}

impl<C: CacheClient> RecipePipeline<C> {
    pub fn new(cache: C, api: Arc<dyn RecipeApi>, settings: PipelineSettings) -> Self {
        Self {
            limiter: RateLimiter::new(cache.clone(), settings.rate_limit),
            cache,
            api,
            locks: KeyedLocks::new(),
            search_ttl: settings.search_ttl,
            detail_ttl: settings.detail_ttl,
        }
    }

    pub async fn search(
        &self,
        client: &str,
        query: &SearchQuery,
    ) -> Result<RecipeCollection, PipelineError> {
        let key = query.cache_key();
        let offset = query.offset();

        self.cached_fetch(client, &key, self.search_ttl, || async move {
            let raw = self.api.search(query).await?;
            Ok(transform::collection_from_search(raw, offset, Utc::now()))
        })
        .await
    }

    pub async fn get_detail(&self, client: &str, id: u64) -> Result<RecipeDetail, PipelineError> {
        let key = CacheKey::detail(id);

        self.cached_fetch(client, &key, self.detail_ttl, || async move {
            let raw = self.api.information(id).await.map_err(|e| {
                if e.is_not_found() {
                    PipelineError::NotFound { id }
                } else {
                    PipelineError::Upstream(e)
                }
            })?;
            Ok(transform::detail_from_information(raw))
        })
        .await
    }

    async fn cached_fetch<T, F, Fut>(
        &self,
        client: &str,
        key: &CacheKey,
        ttl: Duration,
        fetch: F,
    ) -> Result<T, PipelineError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        if let Some(hit) = self.lookup(key).await {
            tracing::debug!(key = %key, "cache hit");
            return Ok(hit);
        }

        let _guard = self.locks.lock(key.as_str()).await;

        // Another request may have filled the entry while we waited.
        if let Some(hit) = self.lookup(key).await {
            tracing::debug!(key = %key, "cache hit after waiting for in-flight fetch");
            return Ok(hit);
        }

        // The slot is reserved before the call so concurrent requests from one
        // client never exceed the window together.
        if !self.limiter.acquire(client).await.map_err(|e| {
            tracing::error!(key = %key, error = %e, "rate limit check failed");
            PipelineError::Store(e)
        })? {
            tracing::info!(key = %key, client, "rate limit exceeded");
            return Err(PipelineError::RateLimited {
                retry_after: self.limiter.window(),
            });
        }

        let value = match fetch().await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, kind = e.kind(), error = %e, "upstream fetch failed");
                // Only successful calls count against the client.
                if let Err(release_err) = self.limiter.release(client).await {
                    tracing::warn!(client, error = %release_err, "failed to release rate limit slot");
                }
                return Err(e);
            }
        };

        self.store(key, &value, ttl).await;

        tracing::info!(key = %key, api = self.api.name(), "fetched from upstream");
        Ok(value)
    }

    /// Cache read, failing open: backend or decode errors count as a miss.
    async fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let raw = match self.cache.get_string(key.as_str()).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache read failed; treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "dropping undecodable cache entry");
                if let Err(e) = self.cache.del(key.as_str()).await {
                    tracing::warn!(key = %key, error = %e, "failed to drop cache entry");
                }
                None
            }
        }
    }

    async fn store<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "failed to encode cache entry");
                return;
            }
        };

        if let Err(e) = self.cache.set_with_ttl(key.as_str(), &raw, ttl).await {
            tracing::warn!(key = %key, error = %e, "cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::MemoryCache;
    use crate::services::recipes::query::Diet;
    use crate::services::recipes::transform::{RawRecipeInformation, RawSearchResponse};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Mode {
        Ok,
        Status(u16),
        Timeout,
    }

    struct FakeApi {
        search_calls: AtomicUsize,
        detail_calls: AtomicUsize,
        mode: Mutex<Mode>,
        latency: Duration,
    }

    impl FakeApi {
        fn new() -> Arc<Self> {
            Self::with_latency(Duration::ZERO)
        }

        fn with_latency(latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                search_calls: AtomicUsize::new(0),
                detail_calls: AtomicUsize::new(0),
                mode: Mutex::new(Mode::Ok),
                latency,
            })
        }

        fn set_mode(&self, mode: Mode) {
            *self.mode.lock().unwrap() = mode;
        }

        fn search_calls(&self) -> usize {
            self.search_calls.load(Ordering::SeqCst)
        }

        fn detail_calls(&self) -> usize {
            self.detail_calls.load(Ordering::SeqCst)
        }

        async fn respond(&self) -> Result<(), UpstreamError> {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            let mode = *self.mode.lock().unwrap();
            match mode {
                Mode::Ok => Ok(()),
                Mode::Status(status) => Err(UpstreamError::Status { status }),
                Mode::Timeout => Err(UpstreamError::Timeout),
            }
        }
    }

    #[async_trait]
    impl RecipeApi for FakeApi {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn search(&self, query: &SearchQuery) -> Result<RawSearchResponse, UpstreamError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            self.respond().await?;
            let used: Vec<_> = query.ingredients().map(|i| json!({"name": i})).collect();
            Ok(serde_json::from_value(json!({
                "results": [{
                    "id": 1,
                    "title": format!("With {}", query.joined_ingredients()),
                    "usedIngredients": used
                }],
                "totalResults": 1
            }))
            .unwrap())
        }

        async fn information(&self, id: u64) -> Result<RawRecipeInformation, UpstreamError> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            self.respond().await?;
            if id == 42 {
                return Err(UpstreamError::Status { status: 404 });
            }
            Ok(serde_json::from_value(json!({"id": id, "title": "Soup"})).unwrap())
        }
    }

    const CLIENT: &str = "203.0.113.9";

    fn settings(max_requests: u64) -> PipelineSettings {
        PipelineSettings {
            search_ttl: Duration::from_secs(30 * 60),
            detail_ttl: Duration::from_secs(60 * 60),
            rate_limit: RateLimitPolicy {
                max_requests,
                window: Duration::from_secs(60),
            },
        }
    }

    fn build(api: &Arc<FakeApi>, max_requests: u64) -> (RecipePipeline<MemoryCache>, MemoryCache) {
        let cache = MemoryCache::new();
        let api: Arc<dyn RecipeApi> = api.clone();
        (
            RecipePipeline::new(cache.clone(), api, settings(max_requests)),
            cache,
        )
    }

    fn query(ingredients: &[&str]) -> SearchQuery {
        SearchQuery::new(ingredients, Some(Diet::Vegetarian), 0).unwrap()
    }

    #[tokio::test]
    async fn second_search_is_served_from_cache() {
        let api = FakeApi::new();
        let (pipeline, _) = build(&api, 10);

        let first = pipeline.search(CLIENT, &query(&["flour", "EGG"])).await.unwrap();
        let second = pipeline.search(CLIENT, &query(&["Egg", "Flour"])).await.unwrap();

        assert_eq!(api.search_calls(), 1);
        assert_eq!(first, second);
        assert_eq!(second.recipes[0].used_ingredients, vec!["egg", "flour"]);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_triggers_exactly_one_new_call() {
        let api = FakeApi::new();
        let (pipeline, _) = build(&api, 10);
        let q = query(&["egg"]);

        pipeline.search(CLIENT, &q).await.unwrap();
        tokio::time::advance(Duration::from_secs(30 * 60)).await;

        pipeline.search(CLIENT, &q).await.unwrap();
        pipeline.search(CLIENT, &q).await.unwrap();
        assert_eq!(api.search_calls(), 2);
    }

    #[tokio::test]
    async fn eleventh_distinct_search_is_rate_limited() {
        let api = FakeApi::new();
        let (pipeline, _) = build(&api, 10);

        for i in 0..10 {
            let name = format!("ingredient-{i}");
            let q = query(&[name.as_str()]);
            pipeline.search(CLIENT, &q).await.unwrap();
        }

        let err = pipeline
            .search(CLIENT, &query(&["something-new"]))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::RateLimited { retry_after } if retry_after == Duration::from_secs(60)));
        assert_eq!(api.search_calls(), 10);

        // Another caller has its own budget.
        pipeline
            .search("198.51.100.1", &query(&["something-new"]))
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_distinct_searches_respect_the_limit() {
        let api = FakeApi::with_latency(Duration::from_millis(200));
        let (pipeline, _) = build(&api, 2);
        let queries: Vec<SearchQuery> = ["egg", "rice", "beans", "kale", "leek"]
            .iter()
            .map(|i| query(&[*i]))
            .collect();

        let (a, b, c, d, e) = tokio::join!(
            pipeline.search(CLIENT, &queries[0]),
            pipeline.search(CLIENT, &queries[1]),
            pipeline.search(CLIENT, &queries[2]),
            pipeline.search(CLIENT, &queries[3]),
            pipeline.search(CLIENT, &queries[4]),
        );
        let results = [a, b, c, d, e];

        assert_eq!(api.search_calls(), 2);
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(PipelineError::RateLimited { .. })))
                .count(),
            3
        );
    }

    #[tokio::test]
    async fn failed_calls_give_the_slot_back() {
        let api = FakeApi::new();
        let (pipeline, _) = build(&api, 1);

        api.set_mode(Mode::Status(500));
        assert!(pipeline.search(CLIENT, &query(&["egg"])).await.is_err());

        api.set_mode(Mode::Ok);
        assert!(matches!(
            pipeline.get_detail(CLIENT, 42).await,
            Err(PipelineError::NotFound { id: 42 })
        ));
        pipeline.search(CLIENT, &query(&["rice"])).await.unwrap();
        let err = pipeline.search(CLIENT, &query(&["kale"])).await.unwrap_err();
        assert!(matches!(err, PipelineError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn cache_hits_do_not_consume_rate_limit() {
        let api = FakeApi::new();
        let (pipeline, _) = build(&api, 1);
        let q = query(&["egg"]);

        pipeline.search(CLIENT, &q).await.unwrap();
        pipeline.search(CLIENT, &q).await.unwrap();
        pipeline.search(CLIENT, &q).await.unwrap();

        assert_eq!(api.search_calls(), 1);
        let err = pipeline.search(CLIENT, &query(&["rice"])).await.unwrap_err();
        assert!(matches!(err, PipelineError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn upstream_failure_stores_nothing() {
        let api = FakeApi::new();
        let (pipeline, cache) = build(&api, 10);

        api.set_mode(Mode::Status(500));
        let err = pipeline.search(CLIENT, &query(&["egg"])).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Upstream(UpstreamError::Status { status: 500 })
        ));

        api.set_mode(Mode::Timeout);
        let err = pipeline.get_detail(CLIENT, 5).await.unwrap_err();
        assert!(matches!(err, PipelineError::Upstream(UpstreamError::Timeout)));

        // Neither a cache entry nor a rate-limit counter is left behind.
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn failed_call_is_not_retried_automatically() {
        let api = FakeApi::new();
        let (pipeline, _) = build(&api, 10);
        let q = query(&["egg"]);

        api.set_mode(Mode::Status(503));
        assert!(pipeline.search(CLIENT, &q).await.is_err());
        assert_eq!(api.search_calls(), 1);

        api.set_mode(Mode::Ok);
        assert!(pipeline.search(CLIENT, &q).await.is_ok());
        assert_eq!(api.search_calls(), 2);
    }

    #[tokio::test]
    async fn unknown_detail_is_not_found() {
        let api = FakeApi::new();
        let (pipeline, cache) = build(&api, 10);

        let err = pipeline.get_detail(CLIENT, 42).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { id: 42 }));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn detail_is_cached() {
        let api = FakeApi::new();
        let (pipeline, _) = build(&api, 10);

        let first = pipeline.get_detail(CLIENT, 5).await.unwrap();
        let second = pipeline.get_detail(CLIENT, 5).await.unwrap();

        assert_eq!(api.detail_calls(), 1);
        assert_eq!(first, second);
        assert_eq!(second.title, "Soup");
    }

    #[tokio::test(start_paused = true)]
    async fn detail_ttl_outlives_search_ttl() {
        let api = FakeApi::new();
        let (pipeline, _) = build(&api, 10);

        pipeline.get_detail(CLIENT, 5).await.unwrap();
        tokio::time::advance(Duration::from_secs(45 * 60)).await;
        pipeline.get_detail(CLIENT, 5).await.unwrap();
        assert_eq!(api.detail_calls(), 1);

        tokio::time::advance(Duration::from_secs(15 * 60)).await;
        pipeline.get_detail(CLIENT, 5).await.unwrap();
        assert_eq!(api.detail_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_identical_searches_share_one_call() {
        let api = FakeApi::with_latency(Duration::from_millis(200));
        let (pipeline, _) = build(&api, 10);
        let q = query(&["egg", "flour"]);

        let (a, b, c) = tokio::join!(
            pipeline.search(CLIENT, &q),
            pipeline.search("198.51.100.1", &q),
            pipeline.search(CLIENT, &q),
        );

        assert_eq!(api.search_calls(), 1);
        assert_eq!(a.unwrap(), b.unwrap());
        assert!(c.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_call_upstream_themselves_after_a_failure() {
        let api = FakeApi::with_latency(Duration::from_millis(200));
        api.set_mode(Mode::Status(500));
        let (pipeline, _) = build(&api, 10);
        let q = query(&["egg"]);

        let (a, b) = tokio::join!(pipeline.search(CLIENT, &q), pipeline.search(CLIENT, &q));

        assert!(a.is_err());
        assert!(b.is_err());
        assert_eq!(api.search_calls(), 2);
    }

    #[tokio::test]
    async fn undecodable_entry_is_refetched() {
        let api = FakeApi::new();
        let (pipeline, cache) = build(&api, 10);
        let q = query(&["egg"]);

        cache
            .set_with_ttl(q.cache_key().as_str(), "{not json", Duration::from_secs(60))
            .await
            .unwrap();

        pipeline.search(CLIENT, &q).await.unwrap();
        assert_eq!(api.search_calls(), 1);
    }
}
