use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::rate_limit::{self, RateLimit, RouteLimit};
use crate::AppState;

pub mod handlers;

/// Build the full HTTP application.
pub fn app(state: Arc<AppState>) -> Router {
    let limited = |route: MethodRouter<Arc<AppState>>,
                   scope: &'static str,
                   limit: Option<RateLimit>| match limit {
        Some(limit) => route.layer(middleware::from_fn_with_state(
            RouteLimit {
                scope,
                limit,
                counters: state.counters.clone(),
                metrics: state.metrics.clone(),
            },
            rate_limit::enforce,
        )),
        None => route,
    };

    Router::new()
        .route("/", get(handlers::index))
        .route("/healthz", get(|| async { "ok" }))
        .route("/metrics", get(handlers::metrics))
        .route(
            "/token/text",
            limited(
                post(handlers::token_from_text),
                "token_text",
                state.config.text_rate_limit,
            ),
        )
        .route(
            "/token/image",
            limited(
                post(handlers::token_from_image),
                "token_image",
                state.config.image_rate_limit,
            ),
        )
        .route(
            "/ocr/text",
            limited(
                post(handlers::ocr_text),
                "ocr_text",
                state.config.ocr_rate_limit,
            ),
        )
        .with_state(state.clone())
        // Request bodies are JSON only; images are fetched by URL.
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
}

/// Middleware: injects a unique X-Request-Id into every response.
/// This allows clients to correlate errors with server logs.
async fn request_id_middleware(req: Request, next: Next) -> Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: injects security headers into every response.
async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    // Verdicts echo token material back; never cache them.
    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));
    headers.remove("Server");

    resp
}
