//! Next-page decisions.
//!
//! The [`Paginator`] looks only at a [`PaginationState`] to decide whether a
//! chain continues, and builds the next request by rewriting the page field
//! of the current one. Every other parameter, header and the URL are carried
//! over untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{CrawlConfig, PaginationConfig};
use crate::extract::coerce::{to_u64, to_i64};
use crate::extract::lookup;
use crate::models::{PageRequest, PaginationState};

/// How a crawl decides whether another page exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationPolicy {
    /// Continue while `page * page_size < total`; no total means stop.
    Count,
    /// Continue while a page comes back full.
    Size,
    /// Count-bounded when the response carries a total, size-bounded otherwise.
    #[default]
    Auto,
    /// One request per chain.
    None,
}

impl TerminationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Size => "size",
            Self::Auto => "auto",
            Self::None => "none",
        }
    }
}

/// Count-bounded rule. A zero page size never continues.
pub fn has_more_by_count(page: u64, page_size: u64, total: u64) -> bool {
    page_size > 0 && page.saturating_mul(page_size) < total
}

/// Size-bounded rule. A zero page size never continues.
pub fn has_more_by_size(items_returned: usize, page_size: u64) -> bool {
    page_size > 0 && items_returned as u64 >= page_size
}

/// Queue key for a page of a chain.
///
/// `<prefix>_<chain>_p<page>`, dropping the parts that do not apply.
pub fn unique_key(prefix: &str, chain: Option<&str>, page: Option<u64>) -> String {
    match (chain, page) {
        (Some(chain), Some(page)) => format!("{}_{}_p{}", prefix, chain, page),
        (None, Some(page)) => format!("{}_p{}", prefix, page),
        (Some(chain), None) => format!("{}_{}", prefix, chain),
        (None, None) => prefix.to_string(),
    }
}

/// Per-crawl pagination policy.
#[derive(Debug, Clone)]
pub struct Paginator {
    policy: TerminationPolicy,
    page_param: String,
    page_size_param: Option<String>,
    page_size: u64,
    start_page: u64,
    total_path: Option<String>,
    key_prefix: String,
}

impl Paginator {
    pub fn new(config: &PaginationConfig, key_prefix: impl Into<String>) -> Self {
        Self {
            policy: config.policy,
            page_param: config.page_param.clone(),
            page_size_param: config.page_size_param.clone(),
            page_size: config.page_size,
            start_page: config.start_page,
            total_path: config.total_path.clone(),
            key_prefix: key_prefix.into(),
        }
    }

    /// Paginator for a crawl definition.
    pub fn for_crawl(crawl: &CrawlConfig) -> Self {
        Self::new(&crawl.pagination, crawl.key_prefix())
    }

    pub fn policy(&self) -> TerminationPolicy {
        self.policy
    }

    pub fn page_param(&self) -> &str {
        &self.page_param
    }

    pub fn start_page(&self) -> u64 {
        self.start_page
    }

    /// Key for `page` of `chain`; unpaginated crawls omit the page.
    pub fn key_for(&self, chain: Option<&str>, page: u64) -> String {
        let page = (self.policy != TerminationPolicy::None).then_some(page);
        unique_key(&self.key_prefix, chain, page)
    }

    /// Page size in effect for a request: its own page-size param, else the configured one.
    pub fn page_size_of(&self, request: &PageRequest) -> u64 {
        self.page_size_param
            .as_ref()
            .and_then(|param| request.params.get(param))
            .and_then(to_u64)
            .unwrap_or(self.page_size)
    }

    /// Build the state for a decoded page.
    pub fn state_for(
        &self,
        request: &PageRequest,
        response: &Value,
        items_returned: usize,
    ) -> PaginationState {
        let total = self
            .total_path
            .as_deref()
            .and_then(|path| lookup(response, path))
            .and_then(to_u64);

        PaginationState::new(
            request.page,
            self.page_size_of(request),
            total,
            items_returned,
        )
    }

    /// Whether the chain continues after the page described by `state`.
    ///
    /// A known total is authoritative; the item count only matters on the
    /// size-bounded path, where an empty page is always the last one.
    pub fn has_more(&self, state: &PaginationState) -> bool {
        match self.policy {
            TerminationPolicy::None => false,
            TerminationPolicy::Count => state
                .total
                .is_some_and(|total| has_more_by_count(state.page, state.page_size, total)),
            TerminationPolicy::Size => has_more_by_size(state.items_returned, state.page_size),
            TerminationPolicy::Auto => match state.total {
                Some(total) => has_more_by_count(state.page, state.page_size, total),
                None => has_more_by_size(state.items_returned, state.page_size),
            },
        }
    }

    /// Next request of the chain, or `None` when the chain is finished.
    pub fn next(&self, current: &PageRequest, state: &PaginationState) -> Option<PageRequest> {
        if !self.has_more(state) {
            return None;
        }

        let next_page = state.page.checked_add(1)?;
        let mut next = current.clone();
        next.params
            .insert(self.page_param.clone(), self.page_value(current, next_page));
        next.page = next_page;
        next.is_seed = false;
        next.unique_key = self.key_for(current.chain.as_deref(), next_page);
        Some(next)
    }

    /// Page number in the same JSON type the current request uses.
    fn page_value(&self, current: &PageRequest, page: u64) -> Value {
        match current.params.get(&self.page_param) {
            Some(Value::String(_)) => Value::String(page.to_string()),
            _ => Value::from(page),
        }
    }
}

/// Page number carried by a request's params, if it parses.
pub fn page_of(params: &serde_json::Map<String, Value>, page_param: &str) -> Option<u64> {
    params
        .get(page_param)
        .and_then(to_i64)
        .and_then(|n| u64::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HttpMethod;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn config(policy: TerminationPolicy, page_param: &str, size_param: &str, size: u64) -> PaginationConfig {
        PaginationConfig {
            policy,
            page_param: page_param.to_string(),
            page_size_param: Some(size_param.to_string()),
            page_size: size,
            ..Default::default()
        }
    }

    fn request(params: Value, chain: Option<&str>, page: u64) -> PageRequest {
        PageRequest {
            crawl: "activity".to_string(),
            url: "https://example.com/search/activity".to_string(),
            method: HttpMethod::Get,
            headers: BTreeMap::from([("accept".to_string(), "application/json".to_string())]),
            params: params.as_object().cloned().unwrap_or_default(),
            unique_key: unique_key("activity", chain, Some(page)),
            chain: chain.map(str::to_string),
            page,
            is_seed: page == 1,
        }
    }

    #[test]
    fn test_count_bounded_rule() {
        for page in 1..=10u64 {
            for total in [0u64, 1, 19, 20, 21, 45, 60, 200] {
                let state = PaginationState::new(page, 20, Some(total), 20);
                let p = Paginator::new(&config(TerminationPolicy::Count, "page", "page_size", 20), "a");
                assert_eq!(p.has_more(&state), page * 20 < total);
            }
        }
    }

    #[test]
    fn test_size_bounded_rule() {
        let p = Paginator::new(&config(TerminationPolicy::Size, "pageIndex", "pageSize", 50), "fans");
        for items in [0usize, 1, 12, 49, 50, 51] {
            let state = PaginationState::new(1, 50, None, items);
            assert_eq!(p.has_more(&state), items >= 50);
        }
    }

    #[test]
    fn test_auto_switches_on_total() {
        let p = Paginator::new(&config(TerminationPolicy::Auto, "page", "page_size", 20), "a");
        assert!(!p.has_more(&PaginationState::new(3, 20, Some(45), 5)));
        assert!(p.has_more(&PaginationState::new(2, 20, Some(45), 20)));
        assert!(p.has_more(&PaginationState::new(1, 20, None, 20)));
        assert!(!p.has_more(&PaginationState::new(1, 20, None, 19)));
    }

    #[test]
    fn test_empty_page_follows_total() {
        for policy in [TerminationPolicy::Count, TerminationPolicy::Auto] {
            let p = Paginator::new(&config(policy, "page", "page_size", 20), "a");
            for (page, total) in [(1u64, 45u64), (2, 45), (3, 45), (1, 20), (1, 0)] {
                let state = PaginationState::new(page, 20, Some(total), 0);
                assert_eq!(p.has_more(&state), page * 20 < total);
            }
        }
    }

    #[test]
    fn test_empty_page_without_total_ends_chain() {
        for policy in [TerminationPolicy::Size, TerminationPolicy::Auto] {
            let p = Paginator::new(&config(policy, "page", "page_size", 20), "a");
            assert!(!p.has_more(&PaginationState::new(1, 20, None, 0)));
        }
    }

    #[test]
    fn test_zero_page_size_never_continues() {
        let p = Paginator::new(&config(TerminationPolicy::Count, "page", "page_size", 0), "a");
        assert!(!p.has_more(&PaginationState::new(1, 0, Some(45), 5)));
        assert!(!has_more_by_count(1, 0, 45));
    }

    #[test]
    fn test_count_policy_without_total_stops() {
        let p = Paginator::new(&config(TerminationPolicy::Count, "page", "page_size", 20), "a");
        assert!(!p.has_more(&PaginationState::new(1, 20, None, 20)));
    }

    #[test]
    fn test_none_policy_never_continues() {
        let p = Paginator::new(&config(TerminationPolicy::None, "page", "page_size", 20), "profile");
        assert!(!p.has_more(&PaginationState::new(1, 20, Some(100), 20)));
        assert_eq!(p.key_for(Some("691067"), 1), "profile_691067");
    }

    #[test]
    fn test_total_of_45_takes_three_pages() {
        let p = Paginator::new(&config(TerminationPolicy::Auto, "page", "page_size", 20), "activity");
        let response = json!({"data": {"total": 45}});
        let mut current = request(json!({"page": 1, "page_size": 20, "timeline": 1}), Some("1"), 1);
        let mut fetched = 1;

        loop {
            let state = p.state_for(&current, &response, 20);
            match p.next(&current, &state) {
                Some(next) => {
                    current = next;
                    fetched += 1;
                }
                None => break,
            }
        }
        assert_eq!(fetched, 3);
        assert_eq!(current.page, 3);
    }

    #[test]
    fn test_next_preserves_sibling_params() {
        let p = Paginator::new(&config(TerminationPolicy::Size, "page", "size", 20), "activity");
        let current = request(json!({"page": 1, "size": 20, "timeline": 1}), Some("1"), 1);
        let state = p.state_for(&current, &json!({}), 20);

        let next = p.next(&current, &state).unwrap();
        assert_eq!(serde_json::Value::Object(next.params.clone()), json!({"page": 2, "size": 20, "timeline": 1}));
        assert_eq!(next.url, current.url);
        assert_eq!(next.headers, current.headers);
        assert_eq!(next.method, current.method);
        assert_eq!(next.unique_key, "activity_1_p2");
        assert_eq!(next.page, 2);
        assert!(!next.is_seed);
    }

    #[test]
    fn test_string_page_stays_string() {
        let p = Paginator::new(&config(TerminationPolicy::Size, "page", "page_size", 2), "activity");
        let current = request(json!({"page": "4", "page_size": "2"}), None, 4);
        let state = p.state_for(&current, &json!({}), 2);
        let next = p.next(&current, &state).unwrap();
        assert_eq!(next.params.get("page"), Some(&json!("5")));
        assert_eq!(next.unique_key, "activity_p5");
    }

    #[test]
    fn test_request_page_size_overrides_config() {
        let p = Paginator::new(&config(TerminationPolicy::Size, "pageIndex", "pageSize", 20), "fans");
        let current = request(json!({"pageIndex": 1, "pageSize": 50}), Some("7"), 1);
        assert_eq!(p.page_size_of(&current), 50);
        let state = p.state_for(&current, &json!({}), 20);
        assert!(p.next(&current, &state).is_none());
    }

    #[test]
    fn test_unique_key_shapes() {
        assert_eq!(unique_key("fans", Some("691067"), Some(2)), "fans_691067_p2");
        assert_eq!(unique_key("topics", None, Some(4)), "topics_p4");
        assert_eq!(unique_key("profile", Some("9"), None), "profile_9");
    }

    #[test]
    fn test_page_of() {
        let params = json!({"page": "3", "pageIndex": 2});
        let params = params.as_object().unwrap();
        assert_eq!(page_of(params, "page"), Some(3));
        assert_eq!(page_of(params, "pageIndex"), Some(2));
        assert_eq!(page_of(params, "missing"), None);
    }
}
