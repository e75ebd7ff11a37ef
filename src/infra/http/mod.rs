mod error;
mod handlers;
mod middleware;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::render::MathService;

pub use error::{ApiError, ErrorEnvelope};
pub use handlers::Submission;
pub use middleware::{REQUEST_ID_HEADER, RequestContext};

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct HttpState {
    pub math: Arc<MathService>,
}

impl HttpState {
    pub fn new(math: Arc<MathService>) -> Self {
        Self { math }
    }
}

/// Render routes plus the health check. Bodies above `max_body_bytes` are rejected.
pub fn build_router(state: HttpState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", post(handlers::render_default))
        .route("/{outformat}", post(handlers::render_format))
        .route("/{outformat}/", post(handlers::render_format))
        .route("/_health", get(handlers::health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
