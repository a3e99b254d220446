//! # Physio Assess API
//!
//! An HTTP API that drives a multi-step physiotherapy assessment: chat-based
//! intake, body-part identification via video, a structured questionnaire
//! exchange with an AI model, range-of-motion (ROM) submission, and a final
//! AI-generated dashboard analysis.
//!
//! ## Architecture
//!
//! ```text
//! Client → HTTP API (axum) → Lifecycle Orchestrator → AI Backend (HTTP)
//!                                    ↓
//!                              SQLite (State)
//! ```
//!
//! The orchestrator owns the assessment state machine
//! (`started → in_progress → {completed, abandoned}`), routes incoming turns
//! to the correct AI call, and drives the terminal dashboard workflow
//! (fetch → analyze → persist → complete).
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use physio_assess::{Config, http};
//! use physio_assess::gateway::HttpGateway;
//! use physio_assess::storage::SqliteStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let store = Arc::new(SqliteStore::new(&config.database).await?);
//!     let gateway = Arc::new(HttpGateway::new(&config.gateway, config.request.clone())?);
//!     let state = http::AppState::new(store, gateway);
//!     let app = http::router(state);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Assessment lifecycle orchestration: state machine, routing, dedup,
/// dashboard pipeline, ROM path.
pub mod assessment;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// AI conversation gateway client and types.
pub mod gateway;
/// HTTP router, handlers, and response envelope.
pub mod http;
/// SQLite storage layer for persistence.
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
