//! # Query Extraction
//!
//! Flat query-string handling for navigation URLs. Values are decoded exactly
//! once, repeated keys keep their last value, and anything unparsable yields
//! an empty mapping instead of an error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;
use url::{form_urlencoded, Url};

/// Decoded query parameters of a URL (last value wins per key)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair, replacing any earlier value for the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder: add a pair
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }

    /// Decode a raw query component (no leading `?`)
    pub fn parse(query: &str) -> Self {
        form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Encode as `application/x-www-form-urlencoded`
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

impl<'a> IntoIterator for &'a QueryParams {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Extract the query parameters of a URL.
///
/// Returns an empty mapping when the URL has no query or cannot be parsed.
pub fn extract_query(url: &str) -> QueryParams {
    match Url::parse(url) {
        Ok(parsed) => parsed.query().map(QueryParams::parse).unwrap_or_default(),
        Err(e) => {
            debug!("Ignoring query of unparsable URL {:?}: {}", url, e);
            QueryParams::new()
        }
    }
}

/// Build a query string (without `?`) from a mapping
pub fn build_query(params: &QueryParams) -> String {
    params.to_query_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple() {
        let params = extract_query("https://x/success?status=approved&payment_id=123");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("status"), Some("approved"));
        assert_eq!(params.get("payment_id"), Some("123"));
    }

    #[test]
    fn test_extract_decodes_once() {
        let params = extract_query("https://x/cb?action=null%2Fprocess&msg=a+b&pct=%2520");
        assert_eq!(params.get("action"), Some("null/process"));
        assert_eq!(params.get("msg"), Some("a b"));
        // %2520 decodes to the literal "%20", not to a space
        assert_eq!(params.get("pct"), Some("%20"));
    }

    #[test]
    fn test_extract_last_value_wins() {
        let params = extract_query("https://x/?status=pending&status=approved");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("status"), Some("approved"));
    }

    #[test]
    fn test_extract_no_query() {
        assert!(extract_query("https://x/success").is_empty());
        assert!(extract_query("https://x/success?").is_empty());
    }

    #[test]
    fn test_extract_malformed() {
        assert!(extract_query("").is_empty());
        assert!(extract_query("not a url ?a=b").is_empty());
        assert!(extract_query("http://[::1").is_empty());
    }

    #[test]
    fn test_extract_ignores_fragment() {
        let params = extract_query("https://x/success?status=approved#top");
        assert_eq!(params.get("status"), Some("approved"));
    }

    #[test]
    fn test_round_trip() {
        let cases = vec![
            QueryParams::new(),
            QueryParams::new().with("status", "approved"),
            // Insertion order differs from sorted key order
            QueryParams::new()
                .with("zeta", "1")
                .with("alpha", "2")
                .with("Mid", "3"),
            QueryParams::new()
                .with("plus", "1+1")
                .with("percent", "100%")
                .with("encoded", "%20")
                .with("spaces", "card declined twice")
                .with("path", "/a/b?c#d"),
            QueryParams::new().with("empty", "").with("tilde", "~x_y.z-"),
        ];

        for params in cases {
            let url = format!("https://x/done?{}", build_query(&params));
            assert_eq!(extract_query(&url), params, "round trip through {}", url);
        }
    }

    #[test]
    fn test_serializes_as_map() {
        let params = QueryParams::new().with("b", "2").with("a", "1");
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"a":"1","b":"2"}"#);
    }
}
