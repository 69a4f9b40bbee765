//! Flat `key=value` query parsing
//!
//! No nesting: keys are taken literally and repeated keys collect into a
//! sequence in order of appearance.

use super::value::{ParsedQuery, QueryValue};
use super::{split_pairs, QueryError, QueryOptions};
use crate::decode::decode_form_component;
use std::collections::BTreeMap;

/// Parse a query string without bracket or dot nesting
pub fn parse_flat(raw: &str, options: &QueryOptions) -> Result<ParsedQuery, QueryError> {
    let mut values: BTreeMap<String, QueryValue> = BTreeMap::new();

    for (key, value) in split_pairs(raw, options)? {
        let key = decode_form_component(key);
        if key.is_empty() {
            continue;
        }
        let value = QueryValue::String(decode_form_component(value));

        match values.remove(&key) {
            None => values.insert(key, value),
            Some(QueryValue::Array(mut existing)) => {
                existing.push(value);
                values.insert(key, QueryValue::Array(existing))
            }
            Some(existing) => values.insert(key, QueryValue::Array(vec![existing, value])),
        };
    }

    Ok(values.into_iter().collect())
}
