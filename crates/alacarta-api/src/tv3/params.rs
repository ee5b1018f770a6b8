//! Web service request and query parameter types.

use std::fmt;

use url::form_urlencoded;

/// A scalar query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Free text.
    Text(String),
    /// Integer, rendered in decimal.
    Int(i64),
    /// Boolean, rendered as `true` / `false`.
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(String::from(value))
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Form-encodes a string (`quote_plus` style: space becomes `+`).
#[must_use]
pub fn form_encode(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// Insertion-ordered parameter mapping.
///
/// Inserting an existing key replaces its value without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, ParamValue)>,
}

impl QueryParams {
    /// Creates an empty mapping.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Sets `key` to `value`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Builder-style `insert`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Looks up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries sorted by key name.
    #[must_use]
    pub fn sorted(&self) -> Vec<(&str, &ParamValue)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Number of entries.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds the live query string: values form-encoded, insertion order.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{k}={}", form_encode(&v.to_string())))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// One web service call: method path plus parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebServiceRequest {
    /// Relative method path (e.g. `p3ac/p3acLlistatVideos.jsp`).
    pub method: String,
    /// Query parameters.
    pub params: QueryParams,
}

impl WebServiceRequest {
    /// Creates a new request.
    #[must_use]
    pub fn new(method: impl Into<String>, params: QueryParams) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_param_value_rendering() {
        // Arrange & Act & Assert
        assert_eq!(ParamValue::from("abc").to_string(), "abc");
        assert_eq!(ParamValue::from(42_u32).to_string(), "42");
        assert_eq!(ParamValue::from(-7_i64).to_string(), "-7");
        assert_eq!(ParamValue::from(true).to_string(), "true");
        assert_eq!(ParamValue::from(false).to_string(), "false");
    }

    #[test]
    fn test_insert_replaces_in_place() {
        // Arrange
        let mut params = QueryParams::new().with("b", 1_u32).with("a", 2_u32);

        // Act
        params.insert("b", 3_u32);

        // Assert
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(params.get("b"), Some(&ParamValue::Int(3)));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_query_string_keeps_insertion_order_and_encodes_values() {
        // Arrange
        let params = QueryParams::new()
            .with("textBusca", "els matins")
            .with("page", 1_u32)
            .with("q", "a&b=c");

        // Act
        let query = params.to_query_string();

        // Assert
        assert_eq!(query, "textBusca=els+matins&page=1&q=a%26b%3Dc");
    }

    #[test]
    fn test_sorted_orders_by_key() {
        // Arrange
        let params: QueryParams = [("z", "1"), ("a", "2"), ("m", "3")].into_iter().collect();

        // Act
        let keys: Vec<&str> = params.sorted().into_iter().map(|(k, _)| k).collect();

        // Assert
        assert_eq!(keys, vec!["a", "m", "z"]);
    }

    #[test]
    fn test_form_encode_non_ascii() {
        // Arrange & Act & Assert
        assert_eq!(form_encode("Polònia"), "Pol%C3%B2nia");
        assert_eq!(form_encode("a b"), "a+b");
    }
}
