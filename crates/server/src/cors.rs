use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

const METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Parse the configured origins, dropping entries that are not valid header values.
/// Returns `None` when every origin should be allowed.
fn parse_origins(allowed_origins: &[String]) -> Option<Vec<HeaderValue>> {
    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return None;
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("CORS: invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();
    if origins.is_empty() {
        tracing::warn!("CORS: no valid origins configured, allowing all");
        None
    } else {
        Some(origins)
    }
}

/// CORS layer for the configured origins. An empty list or `*` mirrors the request origin.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = match parse_origins(allowed_origins) {
        Some(origins) => AllowOrigin::list(origins),
        None => AllowOrigin::mirror_request(),
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(METHODS)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("x-requested-with"),
            HeaderName::from_static("x-request-id"),
        ])
}
