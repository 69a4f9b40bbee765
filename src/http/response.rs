//! HTTP response building module
//!
//! Builders for the responses the request core decides on. They never panic:
//! a builder error is logged and replaced by an empty response.

use super::range::ByteRange;
use crate::decode::PathDecodeError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG, LAST_MODIFIED,
};
use hyper::{HeaderMap, Response, StatusCode};

/// Validator and content headers carried by every body-bearing response
#[derive(Debug, Clone, Default)]
pub struct EntityHeaders {
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl EntityHeaders {
    fn apply(&self, mut builder: hyper::http::response::Builder) -> hyper::http::response::Builder {
        if let Some(content_type) = &self.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(etag) = &self.etag {
            builder = builder.header(ETAG, etag);
        }
        if let Some(last_modified) = &self.last_modified {
            builder = builder.header(LAST_MODIFIED, last_modified);
        }
        builder
    }
}

/// Build 400 Bad Request response for an undecodable path
pub fn build_400_response(err: &PathDecodeError) -> Response<Full<Bytes>> {
    text_response(StatusCode::BAD_REQUEST, format!("400 Bad Request: {err}"))
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    text_response(StatusCode::NOT_FOUND, "404 Not Found".to_string())
}

/// Build 412 Precondition Failed response (no body)
pub fn build_412_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::PRECONDITION_FAILED)
        .header(CONTENT_LENGTH, 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| fallback("412", &e))
}

/// Build 304 Not Modified response, keeping validators
pub fn build_304_response(entity: &EntityHeaders) -> Response<Full<Bytes>> {
    let builder = Response::builder().status(StatusCode::NOT_MODIFIED);
    EntityHeaders {
        content_type: None,
        ..entity.clone()
    }
    .apply(builder)
    .body(Full::new(Bytes::new()))
    .unwrap_or_else(|e| fallback("304", &e))
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(total_size: u64) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(CONTENT_TYPE, "text/plain")
        .header(CONTENT_RANGE, format!("bytes */{total_size}"))
        .body(Full::new(Bytes::from("Range Not Satisfiable")))
        .unwrap_or_else(|e| fallback("416", &e))
}

/// Build 200 OK response with validators
pub fn build_full_response(
    data: Bytes,
    entity: &EntityHeaders,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    entity
        .apply(Response::builder().status(StatusCode::OK))
        .header(CONTENT_LENGTH, content_length)
        .header(ACCEPT_RANGES, "bytes")
        .body(Full::new(body))
        .unwrap_or_else(|e| fallback("200", &e))
}

/// Build 206 Partial Content response for a single range of `data`
pub fn build_partial_response(
    data: &Bytes,
    range: ByteRange,
    entity: &EntityHeaders,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let total = data.len() as u64;
    let body = if is_head {
        Bytes::new()
    } else {
        let start = usize::try_from(range.start).unwrap_or(data.len());
        let end = usize::try_from(range.end).map_or(data.len(), |e| e + 1);
        data.slice(start.min(data.len())..end.min(data.len()))
    };

    entity
        .apply(Response::builder().status(StatusCode::PARTIAL_CONTENT))
        .header(CONTENT_LENGTH, range.length())
        .header(CONTENT_RANGE, range.content_range(total))
        .header(ACCEPT_RANGES, "bytes")
        .body(Full::new(body))
        .unwrap_or_else(|e| fallback("206", &e))
}

/// Copy the entity headers of a built response into a header map
pub fn entity_header_map(entity: &EntityHeaders) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(etag) = entity.etag.as_deref().and_then(|v| v.parse().ok()) {
        headers.insert(ETAG, etag);
    }
    if let Some(last_modified) = entity.last_modified.as_deref().and_then(|v| v.parse().ok()) {
        headers.insert(LAST_MODIFIED, last_modified);
    }
    headers
}

fn text_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| fallback(status.as_str(), &e))
}

/// Log response build error and return an empty response
fn fallback(status: &str, error: &hyper::http::Error) -> Response<Full<Bytes>> {
    crate::logger::log_response_build_error(status, error);
    Response::new(Full::new(Bytes::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> EntityHeaders {
        EntityHeaders {
            content_type: Some("text/plain".to_string()),
            etag: Some("\"abc\"".to_string()),
            last_modified: Some("Sun, 06 Nov 1994 08:49:37 GMT".to_string()),
        }
    }

    #[test]
    fn test_412_has_no_body() {
        let resp = build_412_response();
        assert_eq!(resp.status(), StatusCode::PRECONDITION_FAILED);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "0");
    }

    #[test]
    fn test_304_keeps_validators() {
        let resp = build_304_response(&entity());
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(resp.headers()[ETAG], "\"abc\"");
        assert!(resp.headers().get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_partial_response_headers() {
        let data = Bytes::from_static(b"0123456789");
        let resp = build_partial_response(&data, ByteRange { start: 2, end: 4 }, &entity(), false);
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()[CONTENT_RANGE], "bytes 2-4/10");
        assert_eq!(resp.headers()[CONTENT_LENGTH], "3");
    }

    #[test]
    fn test_full_response_head() {
        let resp = build_full_response(Bytes::from_static(b"hello"), &entity(), true);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "5");
        assert_eq!(resp.headers()[ACCEPT_RANGES], "bytes");
    }

    #[test]
    fn test_400_response() {
        let resp = build_400_response(&PathDecodeError::MalformedEscape("%zz".to_string()));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_entity_header_map() {
        let headers = entity_header_map(&entity());
        assert_eq!(headers[ETAG], "\"abc\"");
        assert_eq!(headers.len(), 2);
    }
}
