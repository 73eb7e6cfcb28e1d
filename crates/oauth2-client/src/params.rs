//! Insertion-ordered form parameters
//!
//! Request bodies, query strings and redirect data are small key/value lists
//! whose order shows up on the wire. `Params` keeps first-insertion order and
//! replaces values in place when a key is set again, so merging extra
//! parameters over computed ones never reorders the computed ones.

use serde_json::{Map, Value};
use url::form_urlencoded;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an existing value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    /// Builder form of [`Params::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    /// Lay every pair of `other` over `self`; `other` wins on collision.
    pub fn extend<I, K, V>(&mut self, other: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in other {
            self.set(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize as `application/x-www-form-urlencoded`.
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }

    /// Parse a form-encoded string. A leading `?` or `#` is ignored and a
    /// repeated key keeps its last value.
    pub fn decode(input: &str) -> Self {
        let input = input
            .strip_prefix('?')
            .or_else(|| input.strip_prefix('#'))
            .unwrap_or(input);
        let mut params = Params::new();
        for (key, value) in form_urlencoded::parse(input.as_bytes()) {
            params.set(key, value);
        }
        params
    }

    /// Convert to a JSON object with string values.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        params.extend(iter);
        params
    }
}

impl IntoIterator for Params {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let mut params = Params::new().with("a", "1").with("b", "2");
        params.set("a", "3");
        assert_eq!(params.encode(), "a=3&b=2");
    }

    #[test]
    fn encode_uses_form_encoding() {
        let params = Params::new()
            .with("redirect_uri", "http://example.com/auth/callback")
            .with("scope", "read write");
        assert_eq!(
            params.encode(),
            "redirect_uri=http%3A%2F%2Fexample.com%2Fauth%2Fcallback&scope=read+write"
        );
    }

    #[test]
    fn empty_values_are_kept() {
        let params = Params::new().with("state", "").with("scope", "");
        assert_eq!(params.encode(), "state=&scope=");
    }

    #[test]
    fn decode_strips_leading_marker() {
        let params = Params::decode("#access_token=abc&token_type=bearer");
        assert_eq!(params.get("access_token"), Some("abc"));
        assert_eq!(params.get("token_type"), Some("bearer"));

        let params = Params::decode("?code=xyz%20123");
        assert_eq!(params.get("code"), Some("xyz 123"));
    }

    #[test]
    fn decode_repeated_key_keeps_last() {
        let params = Params::decode("code=a&code=b");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("code"), Some("b"));
    }

    #[test]
    fn remove_returns_value() {
        let mut params = Params::new().with("a", "1");
        assert_eq!(params.remove("a"), Some("1".into()));
        assert!(params.is_empty());
        assert_eq!(params.remove("a"), None);
    }
}
