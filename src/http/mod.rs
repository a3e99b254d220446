//! HTTP surface.
//!
//! Axum router, shared application state, and the `{success, data, error}`
//! response envelope every assessment-domain endpoint uses.

mod handlers;

pub use handlers::*;

use axum::http::{Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::assessment::{AssessmentService, DashboardPipeline, RomService};
use crate::gateway::ConversationGateway;
use crate::storage::AssessmentStore;

/// Shared application state handed to every handler
pub struct AppState<S, G> {
    pub lifecycle: AssessmentService<S, G>,
    pub dashboard: DashboardPipeline<S, G>,
    pub rom: RomService<S>,
}

impl<S, G> Clone for AppState<S, G> {
    fn clone(&self) -> Self {
        Self {
            lifecycle: self.lifecycle.clone(),
            dashboard: self.dashboard.clone(),
            rom: self.rom.clone(),
        }
    }
}

impl<S, G> AppState<S, G>
where
    S: AssessmentStore,
    G: ConversationGateway,
{
    /// Wire up services over a store and gateway
    pub fn new(store: std::sync::Arc<S>, gateway: std::sync::Arc<G>) -> Self {
        Self {
            lifecycle: AssessmentService::new(store.clone(), gateway.clone()),
            dashboard: DashboardPipeline::new(store.clone(), gateway),
            rom: RomService::new(store),
        }
    }
}

/// Consistent response envelope for assessment-domain endpoints
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 envelope
    pub fn ok(data: T) -> (StatusCode, Json<Self>) {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                data,
                error: None,
            }),
        )
    }

    /// 201 envelope
    pub fn created(data: T) -> (StatusCode, Json<Self>) {
        (
            StatusCode::CREATED,
            Json(Self {
                success: true,
                data,
                error: None,
            }),
        )
    }
}

/// Build the application router
pub fn router<S, G>(state: AppState<S, G>) -> Router
where
    S: AssessmentStore + 'static,
    G: ConversationGateway + 'static,
{
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health))
        .route("/assessments", post(create_assessment))
        .route("/assessments/:assessmentId", get(get_assessment))
        .route("/assessments/:assessmentId/chat", post(send_chat))
        .route("/assessments/:assessmentId/status", post(update_status))
        .route(
            "/assessments/:assessmentId/questionnaires",
            post(send_questionnaire).get(get_questionnaires),
        )
        .route(
            "/assessments/:assessmentId/rom",
            post(submit_rom).get(get_rom),
        )
        .route("/assessments/:assessmentId/dashboard", get(run_dashboard))
        .route(
            "/assessments/:assessmentId/dashboardByAssessmentId",
            get(get_stored_dashboard),
        )
        .with_state(state)
        .layer(cors)
}
