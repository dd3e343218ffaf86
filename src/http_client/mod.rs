//! Page fetcher over reqwest, gated by the shared rate limiter.

mod budget;
mod response;

pub use budget::RequestBudget;
pub use response::{Decoded, PageResult};

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::models::{HttpMethod, PageRequest};
use crate::rate_limit::RateLimiter;

/// Default user agent when none is configured.
pub const USER_AGENT: &str = concat!("apicrawl/", env!("CARGO_PKG_VERSION"));

/// Errors from a fetch. HTTP error statuses are not errors.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network, DNS or TLS failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The run's request budget is spent; nothing was sent.
    #[error("Request budget exhausted")]
    BudgetExhausted,
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Issues one page request.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &PageRequest) -> FetchResult<PageResult>;
}

/// Options for building the underlying HTTP client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP fetcher enforcing rate, concurrency and budget limits.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    rate_limiter: RateLimiter,
    concurrency: Arc<Semaphore>,
    budget: RequestBudget,
}

impl HttpFetcher {
    /// Create a new fetcher.
    pub fn new(
        options: &ClientOptions,
        rate_limiter: RateLimiter,
        concurrency: usize,
        budget: RequestBudget,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(&options.user_agent)
            .timeout(options.timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            rate_limiter,
            concurrency: Arc::new(Semaphore::new(concurrency.max(1))),
            budget,
        })
    }

    /// Get the rate limiter for this fetcher.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn budget(&self) -> &RequestBudget {
        &self.budget
    }

    fn build(&self, request: &PageRequest) -> reqwest::RequestBuilder {
        let mut builder = match request.method {
            HttpMethod::Get => self
                .client
                .get(&request.url)
                .query(&request.query_pairs()),
            HttpMethod::Post => self.client.post(&request.url).json(&request.body()),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &PageRequest) -> FetchResult<PageResult> {
        if !self.budget.try_take() {
            return Err(FetchError::BudgetExhausted);
        }

        let _permit = self
            .concurrency
            .acquire()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        // Wait for rate limiter before making request
        self.rate_limiter.acquire().await;

        let start = Instant::now();
        let response = self
            .build(request)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let duration = start.elapsed();

        debug!(
            "{} {} [{}] -> HTTP {} in {:?} ({} bytes)",
            request.method.as_str(),
            request.url,
            request.unique_key,
            status,
            duration,
            body.len()
        );

        // Report status to rate limiter for adaptive backoff
        self.rate_limiter.report_status(status).await;

        Ok(PageResult::from_body(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::RateLimitConfig;
    use serde_json::json;
    use std::collections::BTreeMap;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(budget: usize) -> HttpFetcher {
        HttpFetcher::new(
            &ClientOptions::default(),
            RateLimiter::with_config(RateLimitConfig::per_minute(6000)),
            1,
            RequestBudget::new(budget),
        )
        .unwrap()
    }

    fn request(url: String, method: HttpMethod, params: serde_json::Value) -> PageRequest {
        PageRequest {
            crawl: "test".to_string(),
            url,
            method,
            headers: BTreeMap::from([("x-token".to_string(), "secret".to_string())]),
            params: params.as_object().cloned().unwrap_or_default(),
            unique_key: "test_p1".to_string(),
            chain: None,
            page: 1,
            is_seed: true,
        }
    }

    #[tokio::test]
    async fn test_get_sends_query_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/activity"))
            .and(query_param("page", "1"))
            .and(query_param("timeline", "1"))
            .and(header("x-token", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data":{}}"#))
            .mount(&server)
            .await;

        let req = request(
            format!("{}/search/activity", server.uri()),
            HttpMethod::Get,
            json!({"page": 1, "timeline": "1"}),
        );
        let page = fetcher(0).fetch(&req).await.unwrap();
        assert_eq!(page.status, 200);
        assert!(page.json().is_some());
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/relations"))
            .and(body_json(json!({"pageIndex": 1, "targetUserId": 7})))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success":true}"#))
            .mount(&server)
            .await;

        let req = request(
            format!("{}/relations", server.uri()),
            HttpMethod::Post,
            json!({"pageIndex": 1, "targetUserId": 7}),
        );
        let page = fetcher(0).fetch(&req).await.unwrap();
        assert_eq!(page.status, 200);
    }

    #[tokio::test]
    async fn test_http_errors_are_not_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let req = request(server.uri(), HttpMethod::Get, json!({}));
        let page = fetcher(0).fetch(&req).await.unwrap();
        assert_eq!(page.status, 500);
        assert!(page.json().is_none());
    }

    #[tokio::test]
    async fn test_rate_limit_status_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let f = fetcher(0);
        let req = request(server.uri(), HttpMethod::Get, json!({}));
        let page = f.fetch(&req).await.unwrap();
        assert_eq!(page.status, 429);
        assert_eq!(f.rate_limiter().get_stats().await.rate_limit_hits, 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_distinct() {
        // Nothing listens on this port
        let req = request(
            "http://127.0.0.1:9/unreachable".to_string(),
            HttpMethod::Get,
            json!({}),
        );
        let err = fetcher(0).fetch(&req).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_budget_exhaustion_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let f = fetcher(1);
        let req = request(server.uri(), HttpMethod::Get, json!({}));
        assert!(f.fetch(&req).await.is_ok());
        assert!(matches!(
            f.fetch(&req).await,
            Err(FetchError::BudgetExhausted)
        ));
    }
}
