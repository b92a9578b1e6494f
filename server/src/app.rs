use std::path::Path;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
    routing::{any, get},
};
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;

use crate::config;
use crate::routes;
use crate::state::AppState;

pub(crate) fn build_app(state: AppState) -> Router {
    let static_assets = Router::new()
        .fallback_service(
            ServeDir::new(config::static_dir())
                .precompressed_br()
                .precompressed_gzip(),
        )
        .layer(middleware::from_fn(set_static_cache_control));

    let body_limit = state.max_body_bytes;
    let api = Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/{*rest}", any(routes::proxy::forward))
        .layer(DefaultBodyLimit::max(body_limit));

    api.layer(CompressionLayer::new())
        .fallback_service(static_assets)
        .with_state(state)
}

async fn set_static_cache_control(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let mut response = next.run(request).await;

    if response.status().is_success() {
        let cache_control = cache_control_for_path(&path).unwrap_or("no-cache");
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(cache_control),
        );
    }

    response
}

/// Fingerprinted bundle files never change; fonts and icons change rarely.
/// The HTML shell must revalidate so a new bundle is picked up.
fn cache_control_for_path(path: &str) -> Option<&'static str> {
    if is_hashed_bundle_asset(path) {
        return Some("public, max-age=31536000, immutable");
    }

    if path.starts_with("/fonts/") || path.starts_with("/icons/") {
        return Some("public, max-age=86400");
    }

    None
}

fn is_hashed_bundle_asset(path: &str) -> bool {
    let path = Path::new(path);
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    if !matches!(ext, "wasm" | "js" | "css") {
        return false;
    }
    let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };

    filename
        .split(['-', '_', '.'])
        .any(|segment| segment.len() >= 8 && segment.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprinted_bundle_is_immutable() {
        assert_eq!(
            cache_control_for_path("/hanoi-flood-client-5d1e0c9a77b2f310_bg.wasm"),
            Some("public, max-age=31536000, immutable")
        );
        assert_eq!(
            cache_control_for_path("/styles-0b84c3d2e9f1a6a7.css"),
            Some("public, max-age=31536000, immutable")
        );
    }

    #[test]
    fn unfingerprinted_script_is_not_immutable() {
        assert_eq!(cache_control_for_path("/hanoi-flood-client.js"), None);
    }

    #[test]
    fn fonts_and_icons_get_a_day() {
        assert_eq!(
            cache_control_for_path("/fonts/inter-regular.woff2"),
            Some("public, max-age=86400")
        );
        assert_eq!(
            cache_control_for_path("/icons/marker.svg"),
            Some("public, max-age=86400")
        );
    }

    #[test]
    fn html_shell_has_no_long_cache() {
        assert_eq!(cache_control_for_path("/"), None);
        assert_eq!(cache_control_for_path("/index.html"), None);
    }
}
