//! Storage layer for assessment persistence.
//!
//! This module provides the domain records (assessments, question exchanges,
//! ROM captures, dashboard analyses) and the [`AssessmentStore`] contract the
//! orchestrator depends on, backed by SQLite.

mod sqlite;

pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageResult;

/// Status of an assessment.
///
/// Transitions are monotonic: `started → in_progress → {completed, abandoned}`.
/// The terminal states never regress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    /// Assessment was created and intake has not advanced yet.
    #[default]
    Started,
    /// The AI conversation signalled forward progress.
    InProgress,
    /// Dashboard analysis ran and the assessment is finished.
    Completed,
    /// The patient walked away before completion.
    Abandoned,
}

impl AssessmentStatus {
    /// Whether this status accepts no further conversational submissions
    pub fn is_terminal(&self) -> bool {
        matches!(self, AssessmentStatus::Completed | AssessmentStatus::Abandoned)
    }
}

impl std::fmt::Display for AssessmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssessmentStatus::Started => write!(f, "started"),
            AssessmentStatus::InProgress => write!(f, "in_progress"),
            AssessmentStatus::Completed => write!(f, "completed"),
            AssessmentStatus::Abandoned => write!(f, "abandoned"),
        }
    }
}

impl std::str::FromStr for AssessmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "started" => Ok(AssessmentStatus::Started),
            "in_progress" => Ok(AssessmentStatus::InProgress),
            "completed" => Ok(AssessmentStatus::Completed),
            "abandoned" => Ok(AssessmentStatus::Abandoned),
            _ => Err(format!("Unknown assessment status: {}", s)),
        }
    }
}

/// One end-to-end physiotherapy evaluation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    /// Unique assessment identifier, assigned at creation.
    pub id: String,
    /// Owning user identifier.
    pub user_id: i64,
    /// Target anatomy identifier.
    pub anatomy_id: i64,
    /// Assessment program type (e.g. "knee").
    pub assessment_type: String,
    /// Current lifecycle status.
    pub status: AssessmentStatus,
    /// When the assessment was created.
    pub created_at: DateTime<Utc>,
}

impl Assessment {
    /// Create a new assessment in the `started` state
    pub fn new(user_id: i64, anatomy_id: i64, assessment_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            anatomy_id,
            assessment_type: assessment_type.into(),
            status: AssessmentStatus::Started,
            created_at: Utc::now(),
        }
    }
}

/// A persisted questionnaire exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Unique record identifier.
    pub id: String,
    /// Parent assessment ID.
    pub assessment_id: String,
    /// The patient's side of the exchange (last user turn).
    pub question: String,
    /// The AI reply payload.
    pub reply: serde_json::Value,
    /// When the exchange was recorded.
    pub created_at: DateTime<Utc>,
}

impl QuestionRecord {
    /// Create a new question record
    pub fn new(
        assessment_id: impl Into<String>,
        question: impl Into<String>,
        reply: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            assessment_id: assessment_id.into(),
            question: question.into(),
            reply,
            created_at: Utc::now(),
        }
    }
}

/// A submitted range-of-motion capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RomRecord {
    /// Unique record identifier.
    pub id: String,
    /// Parent assessment ID.
    pub assessment_id: String,
    /// Opaque pose/ROM payload from the client.
    pub payload: serde_json::Value,
    /// When the capture was submitted.
    pub created_at: DateTime<Utc>,
}

impl RomRecord {
    /// Create a new ROM record
    pub fn new(assessment_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            assessment_id: assessment_id.into(),
            payload,
            created_at: Utc::now(),
        }
    }
}

/// The persisted final AI analysis together with its input snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Unique record identifier.
    pub id: String,
    /// Parent assessment ID.
    pub assessment_id: String,
    /// The AI analysis result.
    pub analysis: serde_json::Value,
    /// The dashboard data snapshot the analysis was computed from.
    pub source_data: serde_json::Value,
    /// When the analysis was persisted.
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// Create a new analysis record
    pub fn new(
        assessment_id: impl Into<String>,
        analysis: serde_json::Value,
        source_data: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            assessment_id: assessment_id.into(),
            analysis,
            source_data,
            created_at: Utc::now(),
        }
    }
}

/// Accumulated input for the final dashboard analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardData {
    pub assessment: Assessment,
    pub questions: Vec<QuestionRecord>,
    pub rom_records: Vec<RomRecord>,
}

/// Persistence contract for assessments and their artifacts.
///
/// Implementations must be safe to share across request handlers.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    // Assessment operations

    /// Persist a newly created assessment.
    async fn create_assessment(&self, assessment: &Assessment) -> StorageResult<()>;
    /// Get an assessment by ID.
    async fn get_assessment(&self, id: &str) -> StorageResult<Option<Assessment>>;
    /// Write a new status for an assessment.
    ///
    /// The write is conditional: a terminal status already on the row is never
    /// overwritten with a different status, so racing writers cannot regress a
    /// finished assessment.
    async fn update_status(&self, id: &str, status: AssessmentStatus) -> StorageResult<()>;

    // Questionnaire operations

    /// Append a questionnaire exchange.
    async fn append_question(&self, record: &QuestionRecord) -> StorageResult<()>;
    /// Get all questionnaire exchanges for an assessment, oldest first.
    async fn get_questions(&self, assessment_id: &str) -> StorageResult<Vec<QuestionRecord>>;

    // ROM operations

    /// Append a ROM capture.
    async fn append_rom(&self, record: &RomRecord) -> StorageResult<()>;
    /// Get all ROM captures for an assessment, oldest first.
    async fn get_rom_records(&self, assessment_id: &str) -> StorageResult<Vec<RomRecord>>;

    // Analysis operations

    /// Persist a dashboard analysis with its source snapshot.
    async fn save_analysis(&self, record: &AnalysisRecord) -> StorageResult<()>;
    /// Get the most recently persisted analysis for an assessment.
    async fn get_analysis(&self, assessment_id: &str) -> StorageResult<Option<AnalysisRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_display_round_trip() {
        for status in [
            AssessmentStatus::Started,
            AssessmentStatus::InProgress,
            AssessmentStatus::Completed,
            AssessmentStatus::Abandoned,
        ] {
            let parsed = AssessmentStatus::from_str(&status.to_string()).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_from_str_rejects_unknown() {
        assert!(AssessmentStatus::from_str("paused").is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!AssessmentStatus::Started.is_terminal());
        assert!(!AssessmentStatus::InProgress.is_terminal());
        assert!(AssessmentStatus::Completed.is_terminal());
        assert!(AssessmentStatus::Abandoned.is_terminal());
    }

    #[test]
    fn test_new_assessment_starts_started() {
        let assessment = Assessment::new(1, 2, "knee");
        assert_eq!(assessment.status, AssessmentStatus::Started);
        assert_eq!(assessment.assessment_type, "knee");
        assert!(!assessment.id.is_empty());
    }
}
