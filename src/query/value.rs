//! Parsed query string values

use serde::Serialize;
use std::collections::BTreeMap;

/// One value of a parsed query string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    String(String),
    Array(Vec<QueryValue>),
    Object(ParsedQuery),
}

impl QueryValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(values) => Some(values),
            _ => None,
        }
    }

    pub const fn as_object(&self) -> Option<&ParsedQuery> {
        match self {
            Self::Object(query) => Some(query),
            _ => None,
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

/// Query string parsed into unique keys at each level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParsedQuery(BTreeMap<String, QueryValue>);

impl ParsedQuery {
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.0.get(key)
    }

    /// String value of `key`, or the first string if it repeats
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            QueryValue::String(s) => Some(s),
            QueryValue::Array(values) => values.first().and_then(QueryValue::as_str),
            QueryValue::Object(_) => None,
        }
    }

    pub fn insert(&mut self, key: String, value: QueryValue) -> Option<QueryValue> {
        self.0.insert(key, value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, QueryValue)> for ParsedQuery {
    fn from_iter<T: IntoIterator<Item = (String, QueryValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
