pub mod health;
pub mod score;
pub mod upload;

use std::any::Any;

use axum::{
    extract::DefaultBodyLimit,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::errors::AppError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/score-resume", post(score::handle_score_resume))
        .route(
            "/upload/resume",
            post(upload::handle_upload_resume)
                .layer(DefaultBodyLimit::max(upload::MAX_UPLOAD_BYTES)),
        )
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// A panicking handler still answers with the standard error body.
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());

    AppError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}
