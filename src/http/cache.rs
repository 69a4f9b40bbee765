//! HTTP cache validation module
//!
//! Provides `ETag` generation and conditional request evaluation:
//! - `If-Match` / `If-Unmodified-Since` preconditions (412)
//! - `If-Range` freshness for partial responses
//! - `If-None-Match` / `If-Modified-Since` freshness (304)
//!
//! Nothing here performs I/O or fails; absent or unparsable headers degrade
//! to "no precondition" and "range fresh".

use super::date::parse_http_date;
use super::tokens::parse_token_list;
use hyper::header::{
    CACHE_CONTROL, ETAG, IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_RANGE,
    IF_UNMODIFIED_SINCE, LAST_MODIFIED, RANGE,
};
use hyper::HeaderMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

const WEAK_PREFIX: &str = "W/";

/// Entity tag for a response body or file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityTag {
    /// Opaque tag without quotes
    pub value: String,
    pub weak: bool,
}

impl EntityTag {
    /// Tag derived from in-memory body bytes
    ///
    /// # Returns
    /// `"<length hex>-<hash hex>"`, e.g. `"b-5eb63bbbe01eeed0"`
    pub fn from_bytes(content: &[u8], weak: bool) -> Self {
        let mut hasher = DefaultHasher::new();
        content.hash(&mut hasher);
        Self {
            value: format!("{:x}-{:x}", content.len(), hasher.finish()),
            weak,
        }
    }

    /// Tag derived from file metadata
    pub fn from_fingerprint(fingerprint: &FileFingerprint, weak: bool) -> Self {
        Self {
            value: format!(
                "{:x}-{:x}-{:x}",
                fingerprint.size,
                fingerprint.modified_millis(),
                fingerprint.id
            ),
            weak,
        }
    }
}

/// Header representation: `"value"` or `W/"value"`
impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weak {
            f.write_str(WEAK_PREFIX)?;
        }
        write!(f, "\"{}\"", self.value)
    }
}

/// Generate the `ETag` header value for a body
pub fn generate_etag(content: &[u8], weak: bool) -> String {
    EntityTag::from_bytes(content, weak).to_string()
}

/// Metadata identifying one version of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileFingerprint {
    pub size: u64,
    pub modified: SystemTime,
    /// Inode number or other stable identifier, 0 if unavailable
    pub id: u64,
}

impl FileFingerprint {
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        #[cfg(unix)]
        let id = std::os::unix::fs::MetadataExt::ino(metadata);
        #[cfg(not(unix))]
        let id = 0;

        Self {
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(UNIX_EPOCH),
            id,
        }
    }

    fn modified_millis(&self) -> u128 {
        self.modified
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis())
    }
}

/// Current validators of the resource being served
///
/// Values are only read when a header needs them.
pub trait Validators {
    fn etag(&self) -> Option<&str>;
    fn last_modified(&self) -> Option<&str>;
}

/// Validators read from response headers already set by the handler
impl Validators for HeaderMap {
    fn etag(&self) -> Option<&str> {
        header_str(self, &ETAG)
    }

    fn last_modified(&self) -> Option<&str> {
        header_str(self, &LAST_MODIFIED)
    }
}

/// Validators held as plain strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceValidators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl Validators for ResourceValidators {
    fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    fn last_modified(&self) -> Option<&str> {
        self.last_modified.as_deref()
    }
}

/// Outcome of conditional request evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalVerdict {
    NoPrecondition,
    PreconditionFailed,
    RangeFresh,
    RangeStale,
}

/// Current tag, with an empty value treated as absent
fn current_etag<V: Validators + ?Sized>(current: &V) -> Option<&str> {
    current.etag().filter(|etag| !etag.is_empty())
}

/// Check `If-Match` / `If-Unmodified-Since`
///
/// # Returns
/// Returns true if the precondition fails (should return 412)
pub fn is_precondition_failure<V: Validators + ?Sized>(
    if_match: Option<&str>,
    if_unmodified_since: Option<&str>,
    current: &V,
) -> bool {
    if let Some(if_match) = if_match.filter(|v| !v.is_empty()) {
        if if_match == "*" {
            return false;
        }
        let Some(etag) = current_etag(current) else {
            return true;
        };
        return !parse_token_list(if_match)
            .into_iter()
            .any(|token| etag_matches(token, etag));
    }

    let Some(unmodified_since) = if_unmodified_since.and_then(parse_http_date) else {
        return false;
    };
    current
        .last_modified()
        .and_then(parse_http_date)
        .map_or(true, |last_modified| last_modified > unmodified_since)
}

/// Check whether a `Range` request still applies per `If-Range`
///
/// # Returns
/// Returns true if the range should be honored
pub fn is_range_fresh<V: Validators + ?Sized>(if_range: Option<&str>, current: &V) -> bool {
    let Some(if_range) = if_range.filter(|v| !v.is_empty()) else {
        return true;
    };

    if if_range.contains('"') {
        return current_etag(current).is_some_and(|etag| if_range.contains(etag));
    }

    let (Some(last_modified), Some(since)) = (
        current.last_modified().and_then(parse_http_date),
        parse_http_date(if_range),
    ) else {
        return true;
    };
    last_modified <= since
}

/// Check `If-None-Match` / `If-Modified-Since` freshness
///
/// # Returns
/// Returns true if the client copy is fresh (should return 304)
pub fn is_fresh<V: Validators + ?Sized>(request: &HeaderMap, current: &V) -> bool {
    let modified_since = header_str(request, &IF_MODIFIED_SINCE);
    let none_match = header_str(request, &IF_NONE_MATCH);
    if modified_since.is_none() && none_match.is_none() {
        return false;
    }

    if header_str(request, &CACHE_CONTROL).is_some_and(has_no_cache) {
        return false;
    }

    if let Some(none_match) = none_match.filter(|v| *v != "*") {
        let Some(etag) = current_etag(current) else {
            return false;
        };
        let matched = parse_token_list(none_match)
            .into_iter()
            .any(|token| etag_matches(token, etag));
        if !matched {
            return false;
        }
    }

    if let Some(modified_since) = modified_since {
        let fresh = match (
            current.last_modified().and_then(parse_http_date),
            parse_http_date(modified_since),
        ) {
            (Some(last_modified), Some(since)) => last_modified <= since,
            _ => false,
        };
        if !fresh {
            return false;
        }
    }

    true
}

/// Evaluate the conditional headers of a request against current validators
pub fn evaluate<V: Validators + ?Sized>(request: &HeaderMap, current: &V) -> ConditionalVerdict {
    if is_precondition_failure(
        header_str(request, &IF_MATCH),
        header_str(request, &IF_UNMODIFIED_SINCE),
        current,
    ) {
        return ConditionalVerdict::PreconditionFailed;
    }

    if !request.contains_key(RANGE) {
        return ConditionalVerdict::NoPrecondition;
    }

    if is_range_fresh(header_str(request, &IF_RANGE), current) {
        ConditionalVerdict::RangeFresh
    } else {
        ConditionalVerdict::RangeStale
    }
}

/// Exact, weak-prefixed, or weak current tag comparison
fn etag_matches(token: &str, etag: &str) -> bool {
    token == etag
        || token.strip_prefix(WEAK_PREFIX) == Some(etag)
        || etag.strip_prefix(WEAK_PREFIX) == Some(token)
}

fn has_no_cache(cache_control: &str) -> bool {
    cache_control
        .split(',')
        .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &hyper::header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
