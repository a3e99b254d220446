use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::gateway::ConversationGateway;
use crate::storage::{
    AnalysisRecord, AssessmentStatus, AssessmentStore, DashboardData,
};

/// Named step of the dashboard completion pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardStep {
    /// Read the accumulated dashboard input data.
    FetchData,
    /// Submit the data to the AI gateway for final analysis.
    Analyze,
    /// Persist the analysis together with its source snapshot.
    PersistAnalysis,
    /// Mark the assessment completed.
    MarkComplete,
}

impl std::fmt::Display for DashboardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardStep::FetchData => write!(f, "fetch_data"),
            DashboardStep::Analyze => write!(f, "analyze"),
            DashboardStep::PersistAnalysis => write!(f, "persist_analysis"),
            DashboardStep::MarkComplete => write!(f, "mark_complete"),
        }
    }
}

/// Pipeline failure tagged with the step that stopped it.
///
/// Steps already committed are not rolled back; re-invoking the pipeline is
/// the recovery path.
#[derive(Debug, Error)]
#[error("dashboard pipeline stopped at {step}: {source}")]
pub struct DashboardFailure {
    pub step: DashboardStep,
    #[source]
    pub source: AppError,
}

impl From<DashboardFailure> for AppError {
    fn from(failure: DashboardFailure) -> Self {
        failure.source
    }
}

/// The terminal fetch → analyze → persist → complete workflow.
///
/// Strictly sequential, no internal retries, no compensation: each step's
/// input depends on the previous step's success, and a failure surfaces
/// immediately with the step it occurred at.
pub struct DashboardPipeline<S, G> {
    store: Arc<S>,
    gateway: Arc<G>,
}

impl<S, G> Clone for DashboardPipeline<S, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<S, G> DashboardPipeline<S, G>
where
    S: AssessmentStore,
    G: ConversationGateway,
{
    /// Create a new dashboard pipeline
    pub fn new(store: Arc<S>, gateway: Arc<G>) -> Self {
        Self { store, gateway }
    }

    /// Run the full completion workflow for an assessment
    pub async fn run(&self, assessment_id: &str) -> Result<AnalysisRecord, DashboardFailure> {
        // Step 1: fetch. No side effects, so nothing to roll back on failure.
        let data = self
            .fetch_data(assessment_id)
            .await
            .map_err(|e| DashboardFailure {
                step: DashboardStep::FetchData,
                source: e,
            })?;

        debug!(
            assessment_id = %assessment_id,
            questions = data.questions.len(),
            rom_records = data.rom_records.len(),
            "Dashboard data fetched"
        );

        // Step 2: analyze. Nothing has been persisted yet on failure.
        let snapshot = serde_json::to_value(&data).unwrap_or(serde_json::Value::Null);
        let analysis = self
            .gateway
            .analyze_dashboard(assessment_id, snapshot.clone())
            .await
            .map_err(|e| DashboardFailure {
                step: DashboardStep::Analyze,
                source: AppError::Upstream(e),
            })?;

        // Step 3: persist analysis with its source snapshot. If this fails
        // the assessment stays in its current status.
        let record = AnalysisRecord::new(assessment_id, analysis, snapshot);
        self.store
            .save_analysis(&record)
            .await
            .map_err(|e| DashboardFailure {
                step: DashboardStep::PersistAnalysis,
                source: e.into(),
            })?;

        // Step 4: mark completed. The persisted analysis stands even if this
        // fails; a re-run recovers.
        self.store
            .update_status(assessment_id, AssessmentStatus::Completed)
            .await
            .map_err(|e| DashboardFailure {
                step: DashboardStep::MarkComplete,
                source: e.into(),
            })?;

        info!(
            assessment_id = %assessment_id,
            analysis_id = %record.id,
            "Dashboard workflow completed"
        );

        Ok(record)
    }

    /// Return the previously persisted analysis without re-running the
    /// workflow
    pub async fn stored_analysis(&self, assessment_id: &str) -> AppResult<AnalysisRecord> {
        self.store
            .get_assessment(assessment_id)
            .await?
            .ok_or_else(|| AppError::assessment_not_found(assessment_id))?;

        self.store
            .get_analysis(assessment_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Analysis",
                id: assessment_id.to_string(),
            })
    }

    /// Gather the accumulated dashboard input for an assessment
    async fn fetch_data(&self, assessment_id: &str) -> AppResult<DashboardData> {
        let assessment = self
            .store
            .get_assessment(assessment_id)
            .await?
            .ok_or_else(|| AppError::assessment_not_found(assessment_id))?;

        let questions = self.store.get_questions(assessment_id).await?;
        let rom_records = self.store.get_rom_records(assessment_id).await?;

        if questions.is_empty() && rom_records.is_empty() {
            return Err(AppError::NotFound {
                resource: "Dashboard data",
                id: assessment_id.to_string(),
            });
        }

        Ok(DashboardData {
            assessment,
            questions,
            rom_records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_display() {
        assert_eq!(DashboardStep::FetchData.to_string(), "fetch_data");
        assert_eq!(DashboardStep::Analyze.to_string(), "analyze");
        assert_eq!(DashboardStep::PersistAnalysis.to_string(), "persist_analysis");
        assert_eq!(DashboardStep::MarkComplete.to_string(), "mark_complete");
    }

    #[test]
    fn test_failure_unwraps_to_source_error() {
        let failure = DashboardFailure {
            step: DashboardStep::Analyze,
            source: AppError::assessment_not_found("a-1"),
        };
        assert!(failure.to_string().contains("analyze"));

        let app_err: AppError = failure.into();
        assert!(matches!(app_err, AppError::NotFound { .. }));
    }
}
