//! Conditional response selection
//!
//! Chooses between 412, 304, 206, 416 and 200 for a cache-validated body,
//! in that order of precedence.

use super::cache::{self, ConditionalVerdict};
use super::range::{parse_range_header, RangeParseResult};
use super::response::{
    build_304_response, build_412_response, build_416_response, build_full_response,
    build_partial_response, entity_header_map, EntityHeaders,
};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::RANGE;
use hyper::{HeaderMap, Response};

/// Respond with `body`, honoring conditional and range headers
///
/// # Arguments
/// * `request` - Request headers
/// * `is_head` - Omit the body
/// * `body` - Full representation
/// * `entity` - Validators already chosen for the representation
pub fn respond(
    request: &HeaderMap,
    is_head: bool,
    body: Bytes,
    entity: &EntityHeaders,
) -> Response<Full<Bytes>> {
    let current = entity_header_map(entity);

    let verdict = cache::evaluate(request, &current);
    if verdict == ConditionalVerdict::PreconditionFailed {
        logger::log_precondition_failed(entity.etag.as_deref());
        return build_412_response();
    }

    if cache::is_fresh(request, &current) {
        return build_304_response(entity);
    }

    if verdict != ConditionalVerdict::RangeFresh {
        return build_full_response(body, entity, is_head);
    }

    let range_header = request.get(RANGE).and_then(|v| v.to_str().ok());
    match parse_range_header(range_header, body.len() as u64) {
        RangeParseResult::Satisfiable(ranges) if ranges.len() == 1 => {
            build_partial_response(&body, ranges[0], entity, is_head)
        }
        RangeParseResult::Unsatisfiable => build_416_response(body.len() as u64),
        // Multiple ranges are served as the full body
        RangeParseResult::Satisfiable(_) | RangeParseResult::Ignored => {
            build_full_response(body, entity, is_head)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::cache::generate_etag;
    use hyper::header::{HeaderValue, IF_MATCH, IF_NONE_MATCH, IF_RANGE};
    use hyper::StatusCode;

    const BODY: &[u8] = b"0123456789";

    fn entity() -> EntityHeaders {
        EntityHeaders {
            content_type: Some("text/plain".to_string()),
            etag: Some(generate_etag(BODY, false)),
            last_modified: Some("Sun, 06 Nov 1994 08:49:37 GMT".to_string()),
        }
    }

    fn request(pairs: &[(hyper::header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn status(headers: &HeaderMap) -> StatusCode {
        respond(headers, false, Bytes::from_static(BODY), &entity()).status()
    }

    #[test]
    fn test_plain_request() {
        assert_eq!(status(&HeaderMap::new()), StatusCode::OK);
    }

    #[test]
    fn test_precondition_failed() {
        assert_eq!(
            status(&request(&[(IF_MATCH, "\"other\"")])),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(status(&request(&[(IF_MATCH, "*")])), StatusCode::OK);
    }

    #[test]
    fn test_not_modified() {
        let etag = generate_etag(BODY, false);
        assert_eq!(
            status(&request(&[(IF_NONE_MATCH, etag.as_str())])),
            StatusCode::NOT_MODIFIED
        );
    }

    #[test]
    fn test_range_requests() {
        let etag = generate_etag(BODY, false);
        assert_eq!(
            status(&request(&[(RANGE, "bytes=0-3")])),
            StatusCode::PARTIAL_CONTENT
        );
        assert_eq!(
            status(&request(&[(RANGE, "bytes=0-3"), (IF_RANGE, etag.as_str())])),
            StatusCode::PARTIAL_CONTENT
        );
        assert_eq!(
            status(&request(&[(RANGE, "bytes=0-3"), (IF_RANGE, "\"stale\"")])),
            StatusCode::OK
        );
        assert_eq!(
            status(&request(&[(RANGE, "bytes=50-")])),
            StatusCode::RANGE_NOT_SATISFIABLE
        );
        assert_eq!(
            status(&request(&[(RANGE, "bytes=0-1,4-5")])),
            StatusCode::OK
        );
    }
}
