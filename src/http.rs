use crate::errors::OrchestratorError;
use crate::schemas::quiz::QuizSubmission;
use crate::service::{LearningService, ServiceError};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

pub type AppState = Arc<LearningService>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuizGenerateBody {
    pub tutorial_id: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HintGenerateBody {
    pub tutorial_id: Option<String>,
    pub question: Option<String>,
}

pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/quiz/generate", post(generate_quiz))
        .route("/quiz/submit", post(submit_quiz))
        .route("/quiz/history/:user_id", get(quiz_history))
        .route("/hint/generate", post(generate_hint))
        .route("/api/users/:user_id/preferences", get(user_preferences))
        .with_state(service)
}

fn error_response(status: StatusCode, label: &str, message: &str) -> Response {
    (status, Json(json!({ "status": label, "message": message }))).into_response()
}

fn rejection_response(rejection: JsonRejection, label: &str) -> Response {
    error_response(rejection.status(), label, &rejection.body_text())
}

fn is_bad_request(err: &ServiceError) -> bool {
    matches!(
        err,
        ServiceError::InvalidInput(_) | ServiceError::Generation(OrchestratorError::Validation(_))
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "service": "generator" }))
}

async fn generate_quiz(
    State(service): State<AppState>,
    body: Result<Json<QuizGenerateBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection, "error"),
    };
    match service
        .generate_assessment(body.tutorial_id.as_deref(), body.user_id.as_deref())
        .await
    {
        Ok(assessment) => Json(json!({
            "status": "success",
            "questions": assessment.questions,
            "userPreferences": assessment.user_preferences,
            "metadata": assessment.metadata,
        }))
        .into_response(),
        Err(e) if is_bad_request(&e) => {
            error_response(StatusCode::BAD_REQUEST, "error", &e.to_string())
        }
        Err(e) => {
            error!("Assessment generation failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "error",
                "Failed to generate assessment.",
            )
        }
    }
}

async fn submit_quiz(
    State(service): State<AppState>,
    submission: Result<Json<QuizSubmission>, JsonRejection>,
) -> Response {
    let Json(submission) = match submission {
        Ok(submission) => submission,
        Err(rejection) => return rejection_response(rejection, "error"),
    };
    match service.submit(submission).await {
        Ok(score) => Json(json!({
            "status": "success",
            "message": "Assessment submitted.",
            "score": score,
        }))
        .into_response(),
        Err(e) if is_bad_request(&e) => {
            error_response(StatusCode::BAD_REQUEST, "error", &e.to_string())
        }
        Err(e) => {
            error!("Submit failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "error",
                "Failed to process submission.",
            )
        }
    }
}

async fn quiz_history(
    State(service): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    let history = service.history(&user_id).await;
    Json(json!({
        "status": "success",
        "data": history,
        "message": "History retrieved.",
    }))
    .into_response()
}

async fn user_preferences(
    State(service): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    match service.preferences(&user_id).await {
        Ok(Some(preferences)) => Json(json!({
            "status": "success",
            "data": preferences,
            "message": "User preferences retrieved.",
        }))
        .into_response(),
        Ok(None) => Json(json!({
            "status": "success",
            "data": {},
            "message": "No preferences found.",
        }))
        .into_response(),
        Err(e) => {
            error!("Fetching preferences for {} failed: {}", user_id, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "error",
                "Failed to fetch preferences.",
            )
        }
    }
}

async fn generate_hint(
    State(service): State<AppState>,
    body: Result<Json<HintGenerateBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection, "fail"),
    };
    match service
        .generate_hint(body.tutorial_id.as_deref(), body.question.as_deref())
        .await
    {
        Ok(hint) => Json(json!({ "status": "success", "data": hint })).into_response(),
        Err(e) if is_bad_request(&e) => {
            error_response(StatusCode::BAD_REQUEST, "fail", &e.to_string())
        }
        Err(e) => {
            error!("Hint generation failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": "Failed to generate hint.",
                    "details": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}
