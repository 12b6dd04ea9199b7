//! REST API handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::core::report::{AssessmentRecord, render_report_email};
use crate::errors::app_error::{AppError, AppResult};
use crate::state::AppState;

/// Subject line for report emails.
const REPORT_SUBJECT: &str = "Your Cultural Intelligence Assessment Report";

/// Health check endpoint.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "service": "cq-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Request body for session finalization.
#[derive(Debug, Deserialize)]
pub struct FinalizeSessionRequest {
    pub email: String,
    pub assessment: AssessmentRecord,
}

/// Finalize an assessment session: generate the AI report (best effort),
/// email it, and store the record.
pub async fn finalize_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<FinalizeSessionRequest>,
) -> AppResult<Json<Value>> {
    let email = request.email.trim().to_string();
    if email.is_empty() {
        return Err(AppError::BadRequest("email is required".to_string()));
    }
    info!(email = %email, "Finalizing assessment session");

    let mut record = request.assessment;

    // Report generation is best effort; the email falls back to the basic
    // score summary when it fails.
    if let Some(generator) = &state.report_generator {
        match generator.generate_html(&email, &record).await {
            Ok(html) => record.ai_report_html = Some(html),
            Err(e) => warn!(email = %email, error = %e, "AI report generation failed, sending basic report"),
        }
    }

    let mailer = state
        .mailer
        .as_ref()
        .ok_or(AppError::NotConfigured("mail delivery"))?;
    let html = render_report_email(&record);
    mailer.send_report(&email, REPORT_SUBJECT, &html).await?;

    state.store.put(&email, record).await?;

    Ok(Json(json!({
        "status": "success",
        "message": "Report sent successfully",
    })))
}

/// Request body for storing a finalized assessment directly.
#[derive(Debug, Deserialize)]
pub struct CreateAssessmentRequest {
    pub email: String,
    pub assessment: AssessmentRecord,
}

/// Store one finalized assessment record.
pub async fn create_assessment(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateAssessmentRequest>,
) -> AppResult<Json<Value>> {
    let email = request.email.trim().to_string();
    if email.is_empty() {
        return Err(AppError::BadRequest("email is required".to_string()));
    }

    state.store.put(&email, request.assessment).await?;
    Ok(Json(json!({ "status": "success" })))
}

/// Query parameters for listing assessments.
#[derive(Debug, Deserialize)]
pub struct ListAssessmentsParams {
    pub email: String,
}

/// List stored assessments for a user, newest first.
pub async fn list_assessments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListAssessmentsParams>,
) -> AppResult<Json<Vec<AssessmentRecord>>> {
    let records = state.store.list(params.email.trim()).await?;
    Ok(Json(records))
}
