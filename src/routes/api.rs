//! REST API route configuration.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::api::{create_assessment, finalize_session, list_assessments};
use crate::state::AppState;

/// Create the protected API router.
///
/// # Endpoints
///
/// - `POST /api/finalize-session` - Generate, email, and store a report
/// - `POST /api/assessments` - Store a finalized assessment
/// - `GET /api/assessments` - List a user's assessments
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/finalize-session", post(finalize_session))
        .route("/api/assessments", post(create_assessment).get(list_assessments))
        .layer(TraceLayer::new_for_http())
}
