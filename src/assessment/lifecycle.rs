use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::dedup::dedup_body_part_turns;
use crate::error::{AppError, AppResult};
use crate::gateway::{AiReply, ConversationGateway, Turn, TurnRole, VideoSubmission};
use crate::storage::{Assessment, AssessmentStatus, AssessmentStore, QuestionRecord};

/// Input for creating a new assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAssessmentParams {
    pub user_id: i64,
    pub anatomy_id: i64,
    pub assessment_type: String,
}

/// Incoming chat turn: history plus an optional video payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatParams {
    #[serde(default)]
    pub chat_history: Vec<Turn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

/// Non-fatal status-transition failure attached to an otherwise
/// successful conversational result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionWarning {
    pub from: AssessmentStatus,
    pub to: AssessmentStatus,
    pub message: String,
}

/// Result of routing a conversation turn.
///
/// The AI reply is the primary contract; a failed best-effort status
/// transition rides along as an explicit warning instead of being
/// silently swallowed.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationOutcome {
    pub reply: AiReply,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<TransitionWarning>,
}

/// The assessment lifecycle orchestrator.
///
/// Owns status transitions, routes incoming turns to the correct AI call,
/// and interprets action signals to advance state.
pub struct AssessmentService<S, G> {
    store: Arc<S>,
    gateway: Arc<G>,
}

impl<S, G> Clone for AssessmentService<S, G> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            gateway: Arc::clone(&self.gateway),
        }
    }
}

impl<S, G> AssessmentService<S, G>
where
    S: AssessmentStore,
    G: ConversationGateway,
{
    /// Create a new lifecycle service
    pub fn new(store: Arc<S>, gateway: Arc<G>) -> Self {
        Self { store, gateway }
    }

    /// Create a new assessment in the `started` state
    pub async fn create(&self, params: CreateAssessmentParams) -> AppResult<Assessment> {
        if params.user_id <= 0 {
            return Err(AppError::Validation {
                field: "userId".to_string(),
                reason: "must be a positive identifier".to_string(),
            });
        }
        if params.anatomy_id <= 0 {
            return Err(AppError::Validation {
                field: "anatomyId".to_string(),
                reason: "must be a positive identifier".to_string(),
            });
        }
        if params.assessment_type.trim().is_empty() {
            return Err(AppError::Validation {
                field: "assessmentType".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let assessment = Assessment::new(
            params.user_id,
            params.anatomy_id,
            params.assessment_type.trim(),
        );
        self.store.create_assessment(&assessment).await?;

        info!(
            assessment_id = %assessment.id,
            user_id = assessment.user_id,
            assessment_type = %assessment.assessment_type,
            "Assessment created"
        );

        Ok(assessment)
    }

    /// Get an assessment by ID
    pub async fn get(&self, id: &str) -> AppResult<Assessment> {
        self.store
            .get_assessment(id)
            .await?
            .ok_or_else(|| AppError::assessment_not_found(id))
    }

    /// Write a new status for an assessment.
    ///
    /// Terminal assessments never move to a different status; any other
    /// target is accepted.
    pub async fn update_status(&self, id: &str, status: AssessmentStatus) -> AppResult<()> {
        let assessment = self.get(id).await?;

        if assessment.status.is_terminal() && assessment.status != status {
            return Err(AppError::AlreadyFinished {
                status: assessment.status.to_string(),
            });
        }

        self.store.update_status(id, status).await?;

        info!(
            assessment_id = %id,
            from = %assessment.status,
            to = %status,
            "Assessment status updated"
        );

        Ok(())
    }

    /// Route a chat turn.
    ///
    /// A non-empty video payload routes exclusively to the
    /// video-identification call; the video turn is never merged into chat
    /// history. Otherwise the history goes to the plain chat call.
    pub async fn handle_chat(&self, id: &str, params: ChatParams) -> AppResult<ConversationOutcome> {
        let assessment = self.get(id).await?;
        self.reject_finished(&assessment)?;

        let video = params.video.filter(|v| !v.is_empty());

        let reply = match video {
            Some(video) => {
                debug!(assessment_id = %id, "Routing to body-part identification");
                self.gateway
                    .identify_body_part(
                        id,
                        VideoSubmission {
                            chat_history: params.chat_history,
                            video,
                        },
                    )
                    .await?
            }
            None => {
                debug!(
                    assessment_id = %id,
                    turns = params.chat_history.len(),
                    "Routing to chat"
                );
                self.gateway.send_chat(id, params.chat_history).await?
            }
        };

        let warning = self.advance_on_action(&assessment, &reply).await;

        Ok(ConversationOutcome { reply, warning })
    }

    /// Route a questionnaire turn.
    ///
    /// Adjacent duplicate body-part-shown artifacts are dropped from the
    /// incoming history before it is forwarded, and the exchange is
    /// persisted so the dashboard workflow can read it back later.
    pub async fn handle_questionnaire(
        &self,
        id: &str,
        history: Vec<Turn>,
    ) -> AppResult<ConversationOutcome> {
        let assessment = self.get(id).await?;
        self.reject_finished(&assessment)?;

        let history = dedup_body_part_turns(history);

        debug!(
            assessment_id = %id,
            turns = history.len(),
            "Routing to questionnaire"
        );

        let question = history
            .iter()
            .rev()
            .find(|t| t.role == TurnRole::User)
            .map(|t| t.content.clone())
            .unwrap_or_default();

        let reply = self.gateway.send_questionnaire(id, history).await?;

        let record = QuestionRecord::new(
            id,
            question,
            serde_json::to_value(&reply).unwrap_or(serde_json::Value::Null),
        );
        self.store.append_question(&record).await?;

        let warning = self.advance_on_action(&assessment, &reply).await;

        Ok(ConversationOutcome { reply, warning })
    }

    /// Get the stored questionnaire exchanges for an assessment
    pub async fn get_questionnaires(&self, id: &str) -> AppResult<Vec<QuestionRecord>> {
        self.get(id).await?;

        let records = self.store.get_questions(id).await?;
        if records.is_empty() {
            return Err(AppError::NotFound {
                resource: "Question data",
                id: id.to_string(),
            });
        }

        Ok(records)
    }

    /// Reject submissions to a finished assessment
    fn reject_finished(&self, assessment: &Assessment) -> AppResult<()> {
        if assessment.status.is_terminal() {
            warn!(
                assessment_id = %assessment.id,
                status = %assessment.status,
                "Rejecting submission to finished assessment"
            );
            return Err(AppError::AlreadyFinished {
                status: assessment.status.to_string(),
            });
        }
        Ok(())
    }

    /// Advance `started → in_progress` when the reply carries an action
    /// signal.
    ///
    /// Best-effort: a transition failure is reported as a warning on the
    /// outcome, never as an error — the conversational result is the
    /// primary contract.
    async fn advance_on_action(
        &self,
        assessment: &Assessment,
        reply: &AiReply,
    ) -> Option<TransitionWarning> {
        let Some(action) = &reply.action else {
            return None;
        };

        info!(assessment_id = %assessment.id, action = ?action, "AI action signal received");

        if assessment.status != AssessmentStatus::Started {
            return None;
        }

        match self
            .store
            .update_status(&assessment.id, AssessmentStatus::InProgress)
            .await
        {
            Ok(()) => {
                info!(assessment_id = %assessment.id, "Assessment moved to in_progress");
                None
            }
            Err(e) => {
                warn!(
                    assessment_id = %assessment.id,
                    error = %e,
                    "Failed to advance assessment status"
                );
                Some(TransitionWarning {
                    from: AssessmentStatus::Started,
                    to: AssessmentStatus::InProgress,
                    message: e.to_string(),
                })
            }
        }
    }
}
