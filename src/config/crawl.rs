//! Crawl definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ConfigError;
use crate::extract::coerce::is_truthy;
use crate::extract::lookup;
use crate::models::{EntityKind, HttpMethod};
use crate::pagination::TerminationPolicy;

fn default_requests_per_minute() -> u32 {
    20
}

fn default_concurrency() -> usize {
    1
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_page_size() -> u64 {
    20
}

fn default_start_page() -> u64 {
    1
}

fn default_items_path() -> String {
    "data.items".to_string()
}

fn default_total_path() -> Option<String> {
    Some("data.total".to_string())
}

fn is_default_policy(policy: &TerminationPolicy) -> bool {
    *policy == TerminationPolicy::default()
}

/// One logical crawl: an endpoint, how to page through it and what it stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Unique crawl name, used on the command line and in queue rows.
    pub name: String,
    /// Entity kind extracted from each item.
    pub entity: EntityKind,
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    /// Static headers. Values may reference environment variables (`${TOKEN}`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Initial query params (GET) or JSON body (POST).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub params: Map<String, Value>,
    /// Prefix of queue keys; defaults to the crawl name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
    /// Param whose value identifies a chain (e.g. `targetUserId`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_param: Option<String>,
    #[serde(default)]
    pub seeds: SeedConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Envelope check; a page failing it ends its chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<SuccessCheck>,
    /// Natural-key paths overriding the entity defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_paths: Vec<String>,
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub max_requests: RequestLimit,
}

impl CrawlConfig {
    pub fn key_prefix(&self) -> &str {
        self.key_prefix.as_deref().unwrap_or(&self.name)
    }

    /// Expand `${VAR}` references in header values.
    pub fn expand_env(&mut self) -> Result<(), ConfigError> {
        for (header, value) in self.headers.iter_mut() {
            let expanded = shellexpand::env(value).map_err(|e| ConfigError::MissingEnv {
                crawl: self.name.clone(),
                header: header.clone(),
                message: e.to_string(),
            })?;
            *value = expanded.into_owned();
        }
        Ok(())
    }

    /// Reject definitions that can never run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            crawl: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if url::Url::parse(&self.url).is_err() {
            return Err(invalid("url is not absolute"));
        }
        if self.requests_per_minute == 0 {
            return Err(invalid("requests_per_minute must be positive"));
        }
        if self.concurrency == 0 {
            return Err(invalid("concurrency must be positive"));
        }
        if self.pagination.policy != TerminationPolicy::None && self.pagination.page_size == 0 {
            return Err(invalid("page_size must be positive"));
        }
        let has_seeds = match &self.seeds {
            SeedConfig::Static { values } => !values.is_empty(),
            SeedConfig::Fans | SeedConfig::Profiles => true,
        };
        if has_seeds && self.chain_param.is_none() {
            return Err(invalid("seed values need a chain_param"));
        }
        Ok(())
    }
}

/// Pagination settings of a crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default, skip_serializing_if = "is_default_policy")]
    pub policy: TerminationPolicy,
    /// Param holding the page number.
    #[serde(default = "default_page_param")]
    pub page_param: String,
    /// Param holding the page size, if the API takes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size_param: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "default_start_page")]
    pub start_page: u64,
    /// Path to the item list (or single object) in the response.
    #[serde(default = "default_items_path")]
    pub items_path: String,
    /// Path to the total count in the response.
    #[serde(default = "default_total_path")]
    pub total_path: Option<String>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            policy: TerminationPolicy::default(),
            page_param: default_page_param(),
            page_size_param: None,
            page_size: default_page_size(),
            start_page: default_start_page(),
            items_path: default_items_path(),
            total_path: default_total_path(),
        }
    }
}

/// Where a crawl's chain values come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SeedConfig {
    /// Explicit values; an empty list means one chain without a chain value.
    Static {
        #[serde(default)]
        values: Vec<Value>,
    },
    /// Every stored follower's `union_user_id`.
    Fans,
    /// Every stored profile's `user_id`.
    Profiles,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self::Static { values: Vec::new() }
    }
}

/// Response envelope check.
///
/// Passes when the value at `path` equals `equals` (or is truthy when
/// `equals` is unset) and every path in `require` is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessCheck {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub require: Vec<String>,
}

impl SuccessCheck {
    pub fn matches(&self, response: &Value) -> bool {
        let flag = match lookup(response, &self.path) {
            Some(value) => match &self.equals {
                Some(expected) => values_equal(value, expected),
                None => is_truthy(value),
            },
            None => false,
        };
        flag && self.require.iter().all(|path| lookup(response, path).is_some())
    }
}

/// Numbers compare by value so `0` matches `0.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Maximum fetches per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestLimit {
    /// Fixed cap; 0 means unlimited.
    Fixed(usize),
    /// `max(seeds * per_seed, floor)`.
    PerSeed { per_seed: usize, floor: usize },
}

impl RequestLimit {
    pub fn resolve(&self, seed_count: usize) -> usize {
        match *self {
            Self::Fixed(limit) => limit,
            Self::PerSeed { per_seed, floor } => seed_count.saturating_mul(per_seed).max(floor),
        }
    }
}

impl Default for RequestLimit {
    fn default() -> Self {
        Self::Fixed(200)
    }
}
