//! Fetched page wrapper.

use serde_json::Value;

/// Decoded form of a response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Json(Value),
    /// Body was not valid JSON; carries the decoder message.
    Invalid(String),
}

/// Result of one fetch: status, raw body and its decoded JSON.
///
/// HTTP error statuses land here too; only transport failures are errors.
#[derive(Debug, Clone)]
pub struct PageResult {
    pub status: u16,
    pub body: String,
    pub decoded: Decoded,
}

impl PageResult {
    /// Build a result, decoding the body as JSON.
    pub fn from_body(status: u16, body: String) -> Self {
        let decoded = match serde_json::from_str::<Value>(&body) {
            Ok(value) => Decoded::Json(value),
            Err(e) => Decoded::Invalid(e.to_string()),
        };
        Self {
            status,
            body,
            decoded,
        }
    }

    /// Check if the response status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decoded JSON, if the body parsed.
    pub fn json(&self) -> Option<&Value> {
        match &self.decoded {
            Decoded::Json(value) => Some(value),
            Decoded::Invalid(_) => None,
        }
    }

    /// Decoder message when the body did not parse.
    pub fn decode_error(&self) -> Option<&str> {
        match &self.decoded {
            Decoded::Json(_) => None,
            Decoded::Invalid(msg) => Some(msg),
        }
    }

    /// First `len` characters of the body, for log lines.
    pub fn preview(&self, len: usize) -> String {
        self.body.chars().take(len).collect()
    }
}
