use axum::http::HeaderName;
use tower_http::cors::{Any, CorsLayer};

/// Build the CORS layer. Permissive for development; tighten for production.
/// `X-Total-Count` must be exposed or browsers cannot read the listing
/// total.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static("x-total-count")])
}
