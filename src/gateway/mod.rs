//! AI conversation gateway.
//!
//! Stateless request/response calls to the model backend for chat, video
//! identification, questionnaire turns, and the final dashboard analysis.

mod client;
mod types;

pub use client::{ConversationGateway, HttpGateway};
pub use types::{
    ActionSignal, AiReply, AnalysisRequest, ConversationRequest, ModelEnvelope, Turn, TurnRole,
    VideoRequest, VideoSubmission, BODY_PART_SHOWN,
};
