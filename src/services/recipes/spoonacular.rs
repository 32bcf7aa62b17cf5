use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::query::{PAGE_SIZE, SearchQuery};
use super::transform::{RawRecipeInformation, RawSearchResponse};
use super::upstream::{RecipeApi, UpstreamError};

pub const DEFAULT_BASE_URL: &str = "https://api.spoonacular.com";

/// Spoonacular client. The API key travels in the `x-api-key` header so it
/// never shows up in URLs or transport error messages.
#[derive(Clone)]
pub struct SpoonacularClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl std::fmt::Debug for SpoonacularClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpoonacularClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl SpoonacularClient {
    /// Creates a client whose every request is bounded by `timeout`.
    ///
    /// # Errors
    /// Returns an error if the base URL is unusable or the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid Spoonacular base URL")?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Spoonacular base URL cannot carry a path: {base_url}");
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("recipe-finder/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::Transport("base URL cannot carry a path".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
        let path = url.path().to_string();
        let resp = self
            .client
            .get(url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout
                } else {
                    UpstreamError::Transport(e.without_url().to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            if status == StatusCode::PAYMENT_REQUIRED {
                tracing::warn!(path = %path, "spoonacular daily quota exhausted");
            }
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        resp.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout
            } else {
                UpstreamError::Decode(e.without_url().to_string())
            }
        })
    }
}

#[async_trait]
impl RecipeApi for SpoonacularClient {
    fn name(&self) -> &'static str {
        "spoonacular"
    }

    async fn search(&self, query: &SearchQuery) -> Result<RawSearchResponse, UpstreamError> {
        let mut url = self.endpoint(&["recipes", "complexSearch"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("includeIngredients", &query.joined_ingredients())
                .append_pair("fillIngredients", "true")
                .append_pair("addRecipeInformation", "true")
                .append_pair("sort", "max-used-ingredients")
                .append_pair("number", &PAGE_SIZE.to_string())
                .append_pair("offset", &query.offset().to_string());
            if let Some(diet) = query.diet() {
                let (name, value) = diet.upstream_param();
                pairs.append_pair(name, value);
            }
        }

        self.get_json(url).await
    }

    async fn information(&self, id: u64) -> Result<RawRecipeInformation, UpstreamError> {
        let id = id.to_string();
        let mut url = self.endpoint(&["recipes", &id, "information"])?;
        url.query_pairs_mut().append_pair("includeNutrition", "true");

        self.get_json(url).await
    }
}
