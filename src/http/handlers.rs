use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{ApiResponse, AppState};
use crate::assessment::ChatParams;
use crate::assessment::CreateAssessmentParams;
use crate::error::{AppError, AppResult};
use crate::gateway::{ConversationGateway, Turn};
use crate::storage::{AssessmentStatus, AssessmentStore};

/// Body of `POST /assessments`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssessmentRequest {
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub anatomy_id: i64,
    #[serde(default)]
    pub assessment_type: String,
}

/// Body of `POST /assessments/{id}/status`
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Body of `POST /assessments/{id}/questionnaires`.
///
/// Accepts either the structured question request or the `chat_history`
/// fallback shape; one typed deserialization of a single body read replaces
/// the original backend's body-re-read middleware.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum QuestionnaireRequest {
    Structured {
        question_history: Vec<Turn>,
    },
    ChatFallback {
        chat_history: Vec<Turn>,
    },
}

impl QuestionnaireRequest {
    fn into_history(self) -> Vec<Turn> {
        match self {
            QuestionnaireRequest::Structured { question_history } => question_history,
            QuestionnaireRequest::ChatFallback { chat_history } => chat_history,
        }
    }
}

/// Liveness probe
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// `POST /assessments`
pub async fn create_assessment<S, G>(
    State(state): State<AppState<S, G>>,
    Json(request): Json<CreateAssessmentRequest>,
) -> AppResult<impl IntoResponse>
where
    S: AssessmentStore,
    G: ConversationGateway,
{
    let assessment = state
        .lifecycle
        .create(CreateAssessmentParams {
            user_id: request.user_id,
            anatomy_id: request.anatomy_id,
            assessment_type: request.assessment_type,
        })
        .await?;

    Ok(ApiResponse::created(assessment))
}

/// `GET /assessments/{id}`
pub async fn get_assessment<S, G>(
    State(state): State<AppState<S, G>>,
    Path(assessment_id): Path<String>,
) -> AppResult<impl IntoResponse>
where
    S: AssessmentStore,
    G: ConversationGateway,
{
    let assessment = state.lifecycle.get(&assessment_id).await?;
    Ok(ApiResponse::ok(assessment))
}

/// `POST /assessments/{id}/chat`
pub async fn send_chat<S, G>(
    State(state): State<AppState<S, G>>,
    Path(assessment_id): Path<String>,
    Json(request): Json<ChatParams>,
) -> AppResult<impl IntoResponse>
where
    S: AssessmentStore,
    G: ConversationGateway,
{
    debug!(
        assessment_id = %assessment_id,
        has_video = request.video.as_deref().is_some_and(|v| !v.is_empty()),
        "Chat request received"
    );

    let outcome = state.lifecycle.handle_chat(&assessment_id, request).await?;
    Ok(ApiResponse::ok(outcome))
}

/// `POST /assessments/{id}/status`
pub async fn update_status<S, G>(
    State(state): State<AppState<S, G>>,
    Path(assessment_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> AppResult<impl IntoResponse>
where
    S: AssessmentStore,
    G: ConversationGateway,
{
    let status: AssessmentStatus =
        request
            .status
            .parse()
            .map_err(|reason: String| AppError::Validation {
                field: "status".to_string(),
                reason,
            })?;

    state.lifecycle.update_status(&assessment_id, status).await?;

    Ok(ApiResponse::ok(json!({
        "message": "Assessment status updated successfully"
    })))
}

/// `POST /assessments/{id}/questionnaires`
pub async fn send_questionnaire<S, G>(
    State(state): State<AppState<S, G>>,
    Path(assessment_id): Path<String>,
    Json(request): Json<QuestionnaireRequest>,
) -> AppResult<impl IntoResponse>
where
    S: AssessmentStore,
    G: ConversationGateway,
{
    let outcome = state
        .lifecycle
        .handle_questionnaire(&assessment_id, request.into_history())
        .await?;

    Ok(ApiResponse::ok(outcome))
}

/// `GET /assessments/{id}/questionnaires`
pub async fn get_questionnaires<S, G>(
    State(state): State<AppState<S, G>>,
    Path(assessment_id): Path<String>,
) -> AppResult<impl IntoResponse>
where
    S: AssessmentStore,
    G: ConversationGateway,
{
    let records = state.lifecycle.get_questionnaires(&assessment_id).await?;
    Ok(ApiResponse::ok(records))
}

/// `POST /assessments/{id}/rom`
pub async fn submit_rom<S, G>(
    State(state): State<AppState<S, G>>,
    Path(assessment_id): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> AppResult<impl IntoResponse>
where
    S: AssessmentStore,
    G: ConversationGateway,
{
    state.rom.submit(&assessment_id, payload).await?;

    Ok(ApiResponse::created(json!(
        "ROM analysis submitted successfully"
    )))
}

/// `GET /assessments/{id}/rom`
pub async fn get_rom<S, G>(
    State(state): State<AppState<S, G>>,
    Path(assessment_id): Path<String>,
) -> AppResult<impl IntoResponse>
where
    S: AssessmentStore,
    G: ConversationGateway,
{
    let records = state.rom.get(&assessment_id).await?;
    Ok(ApiResponse::ok(records))
}

/// `GET /assessments/{id}/dashboard` — runs the full completion workflow
pub async fn run_dashboard<S, G>(
    State(state): State<AppState<S, G>>,
    Path(assessment_id): Path<String>,
) -> AppResult<impl IntoResponse>
where
    S: AssessmentStore,
    G: ConversationGateway,
{
    let record = state.dashboard.run(&assessment_id).await.map_err(AppError::from)?;
    Ok(ApiResponse::ok(record.analysis))
}

/// `GET /assessments/{id}/dashboardByAssessmentId` — returns the stored
/// analysis without recomputation
pub async fn get_stored_dashboard<S, G>(
    State(state): State<AppState<S, G>>,
    Path(assessment_id): Path<String>,
) -> AppResult<impl IntoResponse>
where
    S: AssessmentStore,
    G: ConversationGateway,
{
    let record = state.dashboard.stored_analysis(&assessment_id).await?;
    Ok(ApiResponse::ok(record.analysis))
}
