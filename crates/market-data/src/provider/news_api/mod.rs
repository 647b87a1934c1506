//! NewsAPI headline provider.
//!
//! Queries `GET /v2/everything` for the instrument symbol, newest first, and
//! scores each headline with the lexical [`SentimentScorer`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{FetchParams, Instrument, NewsItem};
use crate::provider::http::{self, build_client, build_url, get_text};
use crate::provider::{DataKind, MarketDataProvider, RateLimit};
use crate::sentiment::SentimentScorer;

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org";
const PROVIDER_ID: &str = "NEWS_API";
const MAX_PAGE_SIZE: usize = 20;

pub struct NewsApiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    requests_per_minute: u32,
    scorer: SentimentScorer,
}

// ============================================================================
// Response structures for NewsAPI
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EverythingResponse {
    status: String,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    source: ArticleSource,
    title: Option<String>,
    url: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ArticleSource {
    name: Option<String>,
}

// ============================================================================
// NewsApiProvider implementation
// ============================================================================

impl NewsApiProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        requests_per_minute: u32,
        scorer: SentimentScorer,
    ) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            requests_per_minute,
            scorer,
        }
    }

    fn parse(&self, body: &str) -> Result<Vec<NewsItem>, MarketDataError> {
        let response: EverythingResponse =
            serde_json::from_str(body).map_err(|e| http::parse_error(PROVIDER_ID, e))?;

        if response.status != "ok" {
            let code = response.code.unwrap_or_default();
            if code == "rateLimited" {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("{}: {}", code, response.message.unwrap_or_default()),
            });
        }

        Ok(response
            .articles
            .into_iter()
            .filter_map(|a| {
                let headline = a.title.filter(|t| !t.trim().is_empty() && t != "[Removed]")?;
                Some(NewsItem {
                    sentiment: self.scorer.score(&headline),
                    headline,
                    source: a.source.name.unwrap_or_else(|| "Unknown".to_string()),
                    url: a.url,
                    published_at: a.published_at?,
                })
            })
            .collect())
    }
}

// ============================================================================
// MarketDataProvider trait implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for NewsApiProvider {
    type Data = Vec<NewsItem>;

    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn kind(&self) -> DataKind {
        DataKind::News
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit::per_minute(self.requests_per_minute)
    }

    async fn fetch(
        &self,
        instrument: &Instrument,
        params: &FetchParams,
    ) -> Result<Vec<NewsItem>, MarketDataError> {
        let mut query = vec![
            ("q", instrument.symbol().to_string()),
            ("sortBy", "publishedAt".to_string()),
            ("language", "en".to_string()),
            ("pageSize", params.limit.clamp(1, MAX_PAGE_SIZE).to_string()),
        ];
        if let Some(start) = params.start {
            query.push(("from", start.to_rfc3339()));
        }
        if let Some(end) = params.end {
            query.push(("to", end.to_rfc3339()));
        }
        query.push(("apiKey", self.api_key.clone()));

        let url = build_url(PROVIDER_ID, &self.base_url, "/v2/everything", &query)?;
        let body = get_text(&self.client, PROVIDER_ID, url, Some(&self.api_key)).await?;
        let items = self.parse(&body)?;

        debug!("{}: {} headlines for {}", PROVIDER_ID, items.len(), instrument);
        Ok(items)
    }
}
