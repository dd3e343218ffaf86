//! Ordered fallback accessors for logical fields.

use serde_json::Value;

use super::coerce::{is_truthy, to_i64, to_text};
use super::path::lookup;

/// One logical field read from an ordered list of JSON paths.
///
/// Accessors try each path in order and stop at the first acceptable value.
/// "Present" means non-null; "truthy" additionally skips `0`, `""`, `false`
/// and empty containers.
#[derive(Debug, Clone, Copy)]
pub struct Fallbacks<'a> {
    name: &'a str,
    paths: &'a [&'a str],
}

impl<'a> Fallbacks<'a> {
    pub const fn new(name: &'a str, paths: &'a [&'a str]) -> Self {
        Self { name, paths }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn paths(&self) -> &'a [&'a str] {
        self.paths
    }

    /// First non-null value.
    pub fn present<'v>(&self, item: &'v Value) -> Option<&'v Value> {
        self.paths.iter().find_map(|path| lookup(item, path))
    }

    /// First truthy value.
    pub fn truthy<'v>(&self, item: &'v Value) -> Option<&'v Value> {
        self.paths
            .iter()
            .filter_map(|path| lookup(item, path))
            .find(|value| is_truthy(value))
    }

    /// First value that converts to an integer.
    pub fn first_i64(&self, item: &Value) -> Option<i64> {
        self.paths
            .iter()
            .filter_map(|path| lookup(item, path))
            .find_map(to_i64)
    }

    /// First truthy value as text.
    pub fn text(&self, item: &Value) -> Option<String> {
        self.truthy(item).and_then(to_text)
    }

    /// First present value as text, keeping empty strings.
    pub fn present_text(&self, item: &Value) -> Option<String> {
        self.present(item).and_then(to_text)
    }

    /// First truthy value as an integer, or `None` if it does not convert.
    pub fn truthy_i64(&self, item: &Value) -> Option<i64> {
        self.truthy(item).and_then(to_i64)
    }

    /// First present value as an integer, defaulting to 0.
    pub fn count(&self, item: &Value) -> i64 {
        self.present(item).and_then(to_i64).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NAME: Fallbacks<'static> = Fallbacks::new("name", &["userName", "user.name"]);
    const USER_ID: Fallbacks<'static> = Fallbacks::new(
        "user_id",
        &["topicUserDTO.unionUserId", "topicUserDTO.userId", "userId"],
    );

    #[test]
    fn test_first_path_wins() {
        let item = json!({"userName": "alice", "user": {"name": "bob"}});
        assert_eq!(NAME.text(&item), Some("alice".to_string()));
    }

    #[test]
    fn test_falls_back_past_falsy_values() {
        let item = json!({"userName": "", "user": {"name": "bob"}});
        assert_eq!(NAME.text(&item), Some("bob".to_string()));
        assert_eq!(NAME.present_text(&item), Some(String::new()));
    }

    #[test]
    fn test_first_i64_skips_unconvertible() {
        let item = json!({"topicUserDTO": {"unionUserId": "n/a", "userId": "17"}, "userId": 3});
        assert_eq!(USER_ID.first_i64(&item), Some(17));
    }

    #[test]
    fn test_missing_everywhere() {
        let item = json!({"other": 1});
        assert!(NAME.present(&item).is_none());
        assert_eq!(USER_ID.first_i64(&item), None);
        assert_eq!(Fallbacks::new("count", &["followCount"]).count(&item), 0);
    }

    #[test]
    fn test_count_coerces_strings() {
        let item = json!({"followCount": "12", "bad": "x"});
        assert_eq!(Fallbacks::new("count", &["followCount"]).count(&item), 12);
        assert_eq!(Fallbacks::new("count", &["bad"]).count(&item), 0);
    }
}
