//! Assessment lifecycle orchestration.
//!
//! This module is the core of the service:
//! - [`AssessmentService`]: state transitions and conversation routing
//! - [`dedup_body_part_turns`]: adjacent body-part artifact removal
//! - [`DashboardPipeline`]: the terminal fetch-analyze-persist-complete workflow
//! - [`RomService`]: range-of-motion submission and retrieval

mod dashboard;
mod dedup;
mod lifecycle;
mod rom;

pub use dashboard::{DashboardFailure, DashboardPipeline, DashboardStep};
pub use dedup::dedup_body_part_turns;
pub use lifecycle::{
    AssessmentService, ChatParams, ConversationOutcome, CreateAssessmentParams, TransitionWarning,
};
pub use rom::RomService;
