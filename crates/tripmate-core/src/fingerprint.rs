//! Search parameter sets and their content-based fingerprints.
//!
//! A [`SearchParams`] is an ordered map of primitive values. Its
//! [`Fingerprint`] is the SHA-256 of a canonical JSON rendering, so two
//! parameter sets holding the same pairs always produce the same key no
//! matter in which order the pairs were inserted.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A primitive parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl ParamValue {
    /// Canonical JSON rendering of this value.
    fn to_json(&self) -> serde_json::Value {
        match self {
            ParamValue::Null => serde_json::Value::Null,
            ParamValue::Bool(b) => serde_json::Value::Bool(*b),
            ParamValue::Int(i) => serde_json::Value::from(*i),
            ParamValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<u8> for ParamValue {
    fn from(value: u8) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ParamValue::Null)
    }
}

/// The exact input parameter set of one provider search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchParams(BTreeMap<String, ParamValue>);

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Text value for `key`, if present and textual.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(ParamValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Integer value for `key`, if present and numeric.
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.0.get(key) {
            Some(ParamValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    /// Partial-match test used by the reuse lookup path.
    ///
    /// Two sets match when they share at least one key and agree on the
    /// value of every shared key. Keys present in only one side are ignored.
    pub fn partially_matches(&self, other: &SearchParams) -> bool {
        let mut shared = 0usize;
        for (key, value) in &self.0 {
            if let Some(other_value) = other.0.get(key) {
                if other_value != value {
                    return false;
                }
                shared += 1;
            }
        }
        shared > 0
    }

    /// Canonical JSON: keys in sorted order, no insignificant whitespace.
    pub fn canonical_json(&self) -> String {
        let body: Vec<String> = self
            .0
            .iter()
            .map(|(k, v)| format!("{}:{}", serde_json::Value::String(k.clone()), v.to_json()))
            .collect();
        format!("{{{}}}", body.join(","))
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for SearchParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = SearchParams::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Deterministic cache key derived from a [`SearchParams`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the fingerprint of a parameter set.
pub fn fingerprint(params: &SearchParams) -> Fingerprint {
    let digest = Sha256::digest(params.canonical_json().as_bytes());
    Fingerprint(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_does_not_matter() {
        let p1 = SearchParams::new().with("a", 1i64).with("b", 2i64);
        let p2 = SearchParams::new().with("b", 2i64).with("a", 1i64);
        assert_eq!(fingerprint(&p1), fingerprint(&p2));
    }

    #[test]
    fn test_different_value_changes_key() {
        let p1 = SearchParams::new().with("a", 1i64);
        let p2 = SearchParams::new().with("a", 2i64);
        assert_ne!(fingerprint(&p1), fingerprint(&p2));
    }

    #[test]
    fn test_type_is_part_of_key() {
        let p1 = SearchParams::new().with("adults", 1i64);
        let p2 = SearchParams::new().with("adults", "1");
        assert_ne!(fingerprint(&p1), fingerprint(&p2));
    }

    #[test]
    fn test_null_differs_from_missing() {
        let p1 = SearchParams::new()
            .with("origin", "DEL")
            .with("return_date", None::<String>);
        let p2 = SearchParams::new().with("origin", "DEL");
        assert_ne!(fingerprint(&p1), fingerprint(&p2));
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = fingerprint(&SearchParams::new().with("location", "Bali"));
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_empty_params_fingerprint_is_stable() {
        assert_eq!(
            fingerprint(&SearchParams::new()),
            fingerprint(&SearchParams::new())
        );
        assert_eq!(SearchParams::new().canonical_json(), "{}");
    }

    #[test]
    fn test_canonical_json_is_sorted() {
        let params = SearchParams::new()
            .with("zeta", true)
            .with("alpha", "x")
            .with("mid", None::<i64>);
        assert_eq!(
            params.canonical_json(),
            r#"{"alpha":"x","mid":null,"zeta":true}"#
        );
    }

    #[test]
    fn test_canonical_json_escapes_keys_and_values() {
        let params = SearchParams::new().with("q", "say \"hi\"");
        assert_eq!(params.canonical_json(), r#"{"q":"say \"hi\""}"#);
    }

    #[test]
    fn test_from_iterator() {
        let params: SearchParams = vec![("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(params.len(), 2);
        assert_eq!(params.text("a"), Some("1"));
    }

    #[test]
    fn test_partial_match_on_shared_keys() {
        let stored = SearchParams::new()
            .with("location", "Bali")
            .with("adults", 1i64)
            .with("hotel_class", 3i64);
        let query = SearchParams::new()
            .with("location", "Bali")
            .with("adults", 1i64);
        assert!(stored.partially_matches(&query));
        assert!(query.partially_matches(&stored));
    }

    #[test]
    fn test_partial_match_rejects_disagreement() {
        let stored = SearchParams::new().with("location", "Bali").with("adults", 1i64);
        let query = SearchParams::new().with("location", "Bali").with("adults", 2i64);
        assert!(!stored.partially_matches(&query));
    }

    #[test]
    fn test_partial_match_requires_a_shared_key() {
        let stored = SearchParams::new().with("location", "Bali");
        let query = SearchParams::new().with("origin", "DEL");
        assert!(!stored.partially_matches(&query));
        assert!(!SearchParams::new().partially_matches(&SearchParams::new()));
    }

    #[test]
    fn test_accessors() {
        let params = SearchParams::new().with("adults", 2u32).with("location", "Paris");
        assert_eq!(params.int("adults"), Some(2));
        assert_eq!(params.text("location"), Some("Paris"));
        assert_eq!(params.text("adults"), None);
        assert_eq!(params.get("missing"), None);
        assert!(!params.is_empty());
    }

    #[test]
    fn test_serde_round_trip_keeps_values() {
        let params = SearchParams::new()
            .with("origin", "DEL")
            .with("return_date", None::<String>)
            .with("adults", 1i64);
        let json = serde_json::to_string(&params).unwrap();
        let back: SearchParams = serde_json::from_str(&json).unwrap();
        assert_eq!(fingerprint(&params), fingerprint(&back));
    }
}
