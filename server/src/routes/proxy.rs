use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use hanoi_flood_shared::api::{CSRF_HEADER, HttpMethod, IDEMPOTENCY_HEADER, endpoint};
use tracing::{debug, warn};

use crate::state::AppState;

/// Request headers the backend needs: session cookie, CSRF token and
/// idempotency key for creates, and the body encoding.
const FORWARDED_REQUEST_HEADERS: &[&str] = &[
    CSRF_HEADER,
    IDEMPOTENCY_HEADER,
    "cookie",
    "content-type",
    "accept",
    "accept-language",
];

/// Response headers passed back to the browser.
const FORWARDED_RESPONSE_HEADERS: &[&str] = &["content-type", "set-cookie", "cache-control"];

fn allowed_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
    }
}

fn upstream_url(base: &str, canonical_path: &str, query: Option<&str>) -> String {
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{base}{canonical_path}?{q}"),
        None => format!("{base}{canonical_path}"),
    }
}

fn method_not_allowed(allowed: &Method) -> Response {
    let mut response = StatusCode::METHOD_NOT_ALLOWED.into_response();
    if let Ok(value) = HeaderValue::from_str(allowed.as_str()) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

/// Forward one allow-listed `/api/*` call to the flood backend.
pub async fn forward(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, StatusCode> {
    let Some((canonical_path, expected)) = endpoint(uri.path()) else {
        state.observability.record_rejected_request();
        debug!(path = uri.path(), "rejected path outside the allow-list");
        return Err(StatusCode::NOT_FOUND);
    };
    let allowed = allowed_method(expected);
    if method != allowed {
        state.observability.record_rejected_request();
        debug!(path = canonical_path, %method, "rejected method");
        return Ok(method_not_allowed(&allowed));
    }
    if expected.needs_csrf() && !headers.contains_key(CSRF_HEADER) {
        debug!(path = canonical_path, "mutating request without CSRF header");
    }

    let url = upstream_url(&state.upstream_base, canonical_path, uri.query());
    let mut request = match expected {
        HttpMethod::Get => state.http_client.get(&url),
        HttpMethod::Post => state.http_client.post(&url).body(body),
    };
    for name in FORWARDED_REQUEST_HEADERS {
        for value in headers.get_all(*name) {
            request = request.header(*name, value.clone());
        }
    }

    state.observability.record_proxied_request();
    let upstream = request.send().await.map_err(|e| {
        state.observability.record_upstream_error();
        warn!(error = %e, path = canonical_path, "upstream request failed");
        StatusCode::BAD_GATEWAY
    })?;

    let status = upstream.status();
    let upstream_headers = upstream.headers().clone();
    let bytes = upstream.bytes().await.map_err(|e| {
        state.observability.record_upstream_error();
        warn!(error = %e, path = canonical_path, "upstream body read failed");
        StatusCode::BAD_GATEWAY
    })?;
    if status.is_server_error() {
        warn!(%status, path = canonical_path, "upstream returned an error");
    } else {
        debug!(%status, path = canonical_path, bytes = bytes.len(), "proxied");
    }

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    let out = response.headers_mut();
    for name in FORWARDED_RESPONSE_HEADERS {
        for value in upstream_headers.get_all(*name) {
            out.append(*name, value.clone());
        }
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{
        Json, Router,
        body::{Body, to_bytes},
        http::{HeaderMap, Method, Request, StatusCode, Uri},
        routing::get,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::upstream_url;
    use crate::state::AppState;

    async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Value> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        Json(json!({
            "method": method.as_str(),
            "path": uri.path(),
            "query": uri.query(),
            "csrf": header("x-csrftoken"),
            "idempotency": header("idempotency-key"),
            "cookie": header("cookie"),
            "body": body,
        }))
    }

    async fn spawn_upstream() -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let app = Router::new()
            .route(
                "/api/weather/",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "weather offline") }),
            )
            .fallback(echo);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind upstream listener");
        let addr = listener.local_addr().expect("upstream address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve upstream");
        });
        (addr, handle)
    }

    async fn gateway() -> (Router, tokio::task::JoinHandle<()>) {
        let (addr, handle) = spawn_upstream().await;
        let state = AppState::with_upstream(format!("http://{addr}"));
        (crate::app::build_app(state), handle)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn upstream_url_keeps_query() {
        assert_eq!(
            upstream_url("http://b", "/api/weather/", Some("lat=21.0&lng=105.8")),
            "http://b/api/weather/?lat=21.0&lng=105.8"
        );
        assert_eq!(
            upstream_url("http://b", "/api/flood-data/", Some("")),
            "http://b/api/flood-data/"
        );
    }

    #[tokio::test]
    async fn unknown_api_path_is_not_found() {
        let (app, upstream) = gateway().await;
        let response = app
            .oneshot(Request::get("/api/admin/users/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        upstream.abort();
    }

    #[tokio::test]
    async fn wrong_method_is_rejected_with_allow_header() {
        let (app, upstream) = gateway().await;
        let response = app
            .oneshot(Request::get("/api/report-flood/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get("allow").unwrap(), "POST");
        upstream.abort();
    }

    #[tokio::test]
    async fn get_is_forwarded_to_canonical_path_with_query() {
        let (app, upstream) = gateway().await;
        let response = app
            .oneshot(
                Request::get("/api/check-flood?lat=21.03&lng=105.85")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let echoed = body_json(response).await;
        assert_eq!(echoed["method"], "GET");
        assert_eq!(echoed["path"], "/api/check-flood/");
        assert_eq!(echoed["query"], "lat=21.03&lng=105.85");
        upstream.abort();
    }

    #[tokio::test]
    async fn post_carries_csrf_idempotency_and_body() {
        let (app, upstream) = gateway().await;
        let request = Request::post("/api/predict-drainage-location/")
            .header("content-type", "application/json")
            .header("x-csrftoken", "tok123")
            .header("idempotency-key", "a1b2")
            .header("cookie", "csrftoken=tok123")
            .body(Body::from(r#"{"lat":21.0,"lng":105.8}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let echoed = body_json(response).await;
        assert_eq!(echoed["method"], "POST");
        assert_eq!(echoed["csrf"], "tok123");
        assert_eq!(echoed["idempotency"], "a1b2");
        assert_eq!(echoed["cookie"], "csrftoken=tok123");
        assert_eq!(echoed["body"], r#"{"lat":21.0,"lng":105.8}"#);
        upstream.abort();
    }

    #[tokio::test]
    async fn upstream_error_status_passes_through() {
        let (app, upstream) = gateway().await;
        let response = app
            .oneshot(Request::get("/api/weather/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"weather offline");
        upstream.abort();
    }

    #[tokio::test]
    async fn unreachable_upstream_is_bad_gateway() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let state = AppState::with_upstream(format!("http://{addr}"));
        let counters = state.observability.clone();
        let app = crate::app::build_app(state);
        let response = app
            .oneshot(Request::get("/api/statistics/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(counters.snapshot().upstream_errors_total, 1);
    }

    #[tokio::test]
    async fn health_is_served_locally() {
        let state = AppState::with_upstream("http://127.0.0.1:9");
        let app = crate::app::build_app(state);
        let response = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["upstream"], "http://127.0.0.1:9");
    }
}
