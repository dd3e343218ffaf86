//! Seed requests: the first page of every chain.

use serde_json::Value;
use tracing::debug;

use crate::config::{CrawlConfig, SeedConfig};
use crate::extract::coerce::to_text;
use crate::models::PageRequest;
use crate::pagination::{page_of, Paginator, TerminationPolicy};
use crate::repository::{RecordRepository, StorageResult};

/// Chain values for a crawl, reading stored ids for table-backed sources.
pub async fn seed_values(
    seeds: &SeedConfig,
    records: &RecordRepository,
) -> StorageResult<Vec<Value>> {
    let values = match seeds {
        SeedConfig::Static { values } => values.clone(),
        SeedConfig::Fans => records
            .fan_user_ids()
            .await?
            .into_iter()
            .map(Value::from)
            .collect(),
        SeedConfig::Profiles => records
            .profile_user_ids()
            .await?
            .into_iter()
            .map(Value::from)
            .collect(),
    };
    debug!("Resolved {} seed values", values.len());
    Ok(values)
}

/// Build the seed request for each chain value.
///
/// No values means a single chain without a chain value.
pub fn seed_requests(crawl: &CrawlConfig, paginator: &Paginator, values: &[Value]) -> Vec<PageRequest> {
    if values.is_empty() {
        return vec![seed_request(crawl, paginator, None)];
    }
    values
        .iter()
        .map(|value| seed_request(crawl, paginator, Some(value)))
        .collect()
}

fn seed_request(crawl: &CrawlConfig, paginator: &Paginator, chain_value: Option<&Value>) -> PageRequest {
    let mut params = crawl.params.clone();

    let chain = match (chain_value, crawl.chain_param.as_ref()) {
        (Some(value), Some(param)) => {
            params.insert(param.clone(), value.clone());
            to_text(value)
        }
        (Some(value), None) => to_text(value),
        (None, _) => None,
    };

    let page = match page_of(&params, paginator.page_param()) {
        Some(page) => page,
        None => {
            let start = paginator.start_page();
            if paginator.policy() != TerminationPolicy::None {
                params.insert(paginator.page_param().to_string(), Value::from(start));
            }
            start
        }
    };

    PageRequest {
        crawl: crawl.name.clone(),
        url: crawl.url.clone(),
        method: crawl.method,
        headers: crawl.headers.clone(),
        params,
        unique_key: paginator.key_for(chain.as_deref(), page),
        chain,
        page,
        is_seed: true,
    }
}
