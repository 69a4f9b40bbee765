//! Request path normalization and decoded route parameters

use crate::decode::{decode_component, PathDecodeError};
use std::borrow::Cow;

/// Collapse runs of `/` into a single separator
///
/// Returns the input unchanged (borrowed) when there is nothing to collapse.
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if !path.contains("//") {
        return Cow::Borrowed(path);
    }

    let mut normalized = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        normalized.push(c);
    }
    Cow::Owned(normalized)
}

/// Decoded route parameters in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    /// Decode raw captures, failing on the first malformed value
    pub fn decode<'a>(
        captures: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, PathDecodeError> {
        let entries = captures
            .into_iter()
            .map(|(name, raw)| Ok((name.to_string(), decode_component(raw)?.into_owned())))
            .collect::<Result<Vec<_>, PathDecodeError>>()?;
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/a//b///c"), "/a/b/c");
        assert_eq!(normalize_path("//"), "/");
        assert!(matches!(normalize_path("/a/b"), Cow::Borrowed("/a/b")));
    }

    #[test]
    fn test_params_decode() {
        let params = Params::decode([("name", "John%20Doe"), ("id", "7")]).unwrap();
        assert_eq!(params.get("name"), Some("John Doe"));
        assert_eq!(params.get("id"), Some("7"));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.iter().map(|(k, _)| k).collect::<Vec<_>>(), ["name", "id"]);
    }

    #[test]
    fn test_params_decode_failure() {
        let err = Params::decode([("name", "%E0%A4%A")]).unwrap_err();
        assert!(matches!(err, PathDecodeError::MalformedEscape(_)));
    }
}
