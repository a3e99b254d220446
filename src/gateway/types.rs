use serde::{Deserialize, Serialize};

/// Marker content the frontend inserts after a successful video identification.
///
/// Consecutive repeats of this turn are stripped before forwarding a
/// questionnaire history to the model backend.
pub const BODY_PART_SHOWN: &str = "User has shown body part on video";

/// One exchange unit in a chat or questionnaire history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    System,
    User,
    Assistant,
}

impl Turn {
    /// Create a system turn
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::System,
            content: content.into(),
        }
    }

    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }

    /// Whether this turn is the fixed body-part-shown artifact
    pub fn is_body_part_shown(&self) -> bool {
        self.role == TurnRole::User && self.content == BODY_PART_SHOWN
    }
}

/// Chat history plus a video clip for body-part identification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSubmission {
    pub chat_history: Vec<Turn>,
    /// Base64-encoded video payload
    pub video: String,
}

/// Signal from the AI that the conversation should advance assessment state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSignal(pub serde_json::Value);

/// Typed reply from the model backend.
///
/// The `action` field is the explicit advance-state signal; everything else
/// the model returns rides along in `body` untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionSignal>,
    #[serde(flatten)]
    pub body: serde_json::Map<String, serde_json::Value>,
}

impl AiReply {
    /// Reply with no action signal
    pub fn new(body: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { action: None, body }
    }

    /// Attach an action signal
    pub fn with_action(mut self, action: serde_json::Value) -> Self {
        self.action = Some(ActionSignal(action));
        self
    }

    /// Whether the reply carries an advance-state signal
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }
}

/// Wire envelope the model backend wraps every response in
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEnvelope<T> {
    pub success: bool,
    pub data: T,
}

/// Request body for chat and questionnaire calls
#[derive(Debug, Clone, Serialize)]
pub struct ConversationRequest {
    pub assessment_id: String,
    pub history: Vec<Turn>,
}

/// Request body for the video-identification call
#[derive(Debug, Clone, Serialize)]
pub struct VideoRequest {
    pub assessment_id: String,
    pub chat_history: Vec<Turn>,
    pub video: String,
}

/// Request body for the final dashboard analysis call
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub assessment_id: String,
    pub dashboard: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_part_shown_classification() {
        assert!(Turn::user(BODY_PART_SHOWN).is_body_part_shown());
        assert!(!Turn::user("my knee hurts").is_body_part_shown());
        // Only the user-role artifact counts
        assert!(!Turn::assistant(BODY_PART_SHOWN).is_body_part_shown());
    }

    #[test]
    fn test_ai_reply_action_round_trip() {
        let raw = json!({
            "message": "Thanks, moving on.",
            "action": "show_questionnaire"
        });
        let reply: AiReply = serde_json::from_value(raw).unwrap();
        assert!(reply.has_action());
        assert_eq!(
            reply.action,
            Some(ActionSignal(json!("show_questionnaire")))
        );
        assert_eq!(reply.body["message"], "Thanks, moving on.");
    }

    #[test]
    fn test_ai_reply_without_action() {
        let raw = json!({ "message": "Tell me more." });
        let reply: AiReply = serde_json::from_value(raw).unwrap();
        assert!(!reply.has_action());
    }

    #[test]
    fn test_turn_role_serialization() {
        let turn = Turn::user("hello");
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["role"], "user");
    }
}
