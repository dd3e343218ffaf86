//! Page request and pagination state models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// HTTP method used by a crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Params are sent as the query string.
    #[default]
    Get,
    /// Params are sent as a JSON body.
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            _ => None,
        }
    }
}

/// One page fetch, fully described.
///
/// `params` holds the query parameters for GET requests and the JSON body
/// for POST requests. Pagination only ever rewrites the page field inside
/// `params`; the URL is carried unchanged from the seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Name of the crawl this request belongs to.
    pub crawl: String,
    pub url: String,
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub params: Map<String, Value>,
    /// Queue identity; equal keys are the same request.
    pub unique_key: String,
    /// Value identifying the logical chain (e.g. the target user id).
    pub chain: Option<String>,
    /// Page number of this request within its chain.
    pub page: u64,
    /// True for the first request of a chain.
    #[serde(default)]
    pub is_seed: bool,
}

impl PageRequest {
    /// Params rendered as query pairs (strings unquoted, everything else as JSON).
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect()
    }

    /// Params rendered as a JSON body.
    pub fn body(&self) -> Value {
        Value::Object(self.params.clone())
    }

    /// Human-readable chain label for logs.
    pub fn chain_label(&self) -> &str {
        self.chain.as_deref().unwrap_or("-")
    }
}

/// Everything the paginator needs to decide whether a chain continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    /// Page index of the request that produced this state.
    pub page: u64,
    pub page_size: u64,
    /// Total item count reported by the response, if any.
    pub total: Option<u64>,
    /// Number of items extracted from this page.
    pub items_returned: usize,
}

impl PaginationState {
    pub fn new(page: u64, page_size: u64, total: Option<u64>, items_returned: usize) -> Self {
        Self {
            page,
            page_size,
            total,
            items_returned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(params: Value) -> PageRequest {
        PageRequest {
            crawl: "activity".to_string(),
            url: "https://example.com/search/activity".to_string(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            params: params.as_object().cloned().unwrap_or_default(),
            unique_key: "activity_1_p1".to_string(),
            chain: Some("1".to_string()),
            page: 1,
            is_seed: true,
        }
    }

    #[test]
    fn test_query_pairs_render_strings_without_quotes() {
        let req = request(json!({"page": 1, "timeline": "1", "keyword": ""}));
        let pairs = req.query_pairs();
        assert!(pairs.contains(&("page".to_string(), "1".to_string())));
        assert!(pairs.contains(&("timeline".to_string(), "1".to_string())));
        assert!(pairs.contains(&("keyword".to_string(), String::new())));
    }

    #[test]
    fn test_method_round_trip() {
        assert_eq!(HttpMethod::from_str("post"), Some(HttpMethod::Post));
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::from_str("PATCH"), None);
    }

    #[test]
    fn test_request_serializes_for_queue_storage() {
        let req = request(json!({"page": 2}));
        let text = serde_json::to_string(&req).unwrap();
        let back: PageRequest = serde_json::from_str(&text).unwrap();
        assert_eq!(back, req);
    }
}
