//! End-to-end flow: route lookup, request context, client address and
//! conditional response selection.

use hyper::body::Bytes;
use hyper::header::{HeaderValue, IF_NONE_MATCH, RANGE};
use hyper::{HeaderMap, StatusCode};
use pretty_assertions::assert_eq;
use waymark::config::{ProxyConfig, TrustSetting};
use waymark::http::response::build_400_response;
use waymark::http::{respond, EntityHeaders};
use waymark::{AppState, RouteOutcome, Router, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handler {
    Home,
    User,
    Assets,
}

fn router() -> Router<Handler> {
    let mut router = Router::new();
    router
        .route("/", Handler::Home)
        .unwrap()
        .route("/user/:id", Handler::User)
        .unwrap()
        .mount("/assets", Handler::Assets)
        .unwrap();
    router
}

fn state() -> AppState {
    let settings = Settings {
        proxy: ProxyConfig {
            trust: TrustSetting::Addresses("loopback, 10.0.0.0/8".to_string()),
        },
        ..Settings::default()
    };
    AppState::new(&settings).unwrap()
}

#[test]
fn test_user_route_with_query_and_client_addr() {
    let router = router();
    let state = state();

    let matched = router.lookup("/user/42").matched().unwrap();
    assert_eq!(*matched.handler, Handler::User);

    let ctx = state.request("/user/42", matched.params, Some("tab=posts&page=2"));
    assert_eq!(ctx.params().get("id"), Some("42"));
    assert_eq!(ctx.query().unwrap().get_str("page"), Some("2"));

    let client = state.client_addr("127.0.0.1", Some("198.51.100.7, 10.1.2.3"));
    assert_eq!(client, "198.51.100.7");
}

#[test]
fn test_mount_strips_prefix() {
    let router = router();
    let matched = router.lookup("/assets//css/site.css").matched().unwrap();
    assert_eq!(*matched.handler, Handler::Assets);
    assert_eq!(matched.matched_path, "/assets");
    assert_eq!(matched.remaining_path, "/css/site.css");
}

#[test]
fn test_bad_encoding_is_400() {
    let router = router();
    match router.lookup("/user/%E0%A4%A") {
        RouteOutcome::BadRequest(err) => {
            assert_eq!(build_400_response(&err).status(), StatusCode::BAD_REQUEST);
        }
        other => panic!("expected a bad request, got {other:?}"),
    }
    assert!(matches!(router.lookup("/nowhere"), RouteOutcome::NotFound));
}

#[test]
fn test_conditional_response_cycle() {
    let state = state();
    let body = Bytes::from_static(b"hello, world");
    let entity = EntityHeaders {
        content_type: Some("text/plain".to_string()),
        etag: state.etag_for(&body),
        last_modified: None,
    };

    let first = respond(&HeaderMap::new(), false, body.clone(), &entity);
    assert_eq!(first.status(), StatusCode::OK);
    let etag = first.headers().get("etag").cloned().unwrap();

    let mut revalidate = HeaderMap::new();
    revalidate.insert(IF_NONE_MATCH, etag);
    let second = respond(&revalidate, false, body.clone(), &entity);
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);

    let mut ranged = HeaderMap::new();
    ranged.insert(RANGE, HeaderValue::from_static("bytes=0-4"));
    let partial = respond(&ranged, false, body, &entity);
    assert_eq!(partial.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        partial.headers().get("content-range").unwrap(),
        "bytes 0-4/12"
    );
}
