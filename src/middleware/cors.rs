use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// Any origin may call the quiz API; only the verbs it serves are allowed.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(Any)
}
