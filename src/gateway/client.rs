use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::types::{
    AiReply, AnalysisRequest, ConversationRequest, ModelEnvelope, Turn, VideoRequest,
    VideoSubmission,
};
use crate::config::{GatewayConfig, RequestConfig};
use crate::error::{GatewayError, GatewayResult};

/// Stateless request/response interface to the AI model backend.
///
/// The orchestrator depends on this contract only; timeouts and retries are
/// the implementation's concern.
#[async_trait]
pub trait ConversationGateway: Send + Sync {
    /// Forward a chat history for a conversational reply
    async fn send_chat(&self, assessment_id: &str, history: Vec<Turn>) -> GatewayResult<AiReply>;

    /// Submit a video clip for body-part identification
    async fn identify_body_part(
        &self,
        assessment_id: &str,
        submission: VideoSubmission,
    ) -> GatewayResult<AiReply>;

    /// Forward a questionnaire turn history
    async fn send_questionnaire(
        &self,
        assessment_id: &str,
        history: Vec<Turn>,
    ) -> GatewayResult<AiReply>;

    /// Submit accumulated dashboard data for the final analysis
    async fn analyze_dashboard(
        &self,
        assessment_id: &str,
        dashboard: serde_json::Value,
    ) -> GatewayResult<serde_json::Value>;
}

/// HTTP implementation of the conversation gateway
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    api_key: String,
    request_config: RequestConfig,
}

impl HttpGateway {
    /// Create a new gateway client
    pub fn new(config: &GatewayConfig, request_config: RequestConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(GatewayError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_config,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST to a backend path with bounded retry and exponential backoff
    async fn call<Req, Resp>(&self, path: &str, request: &Req) -> GatewayResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = Duration::from_millis(
                    self.request_config.retry_delay_ms * (2_u64.pow(retries - 1)),
                );
                warn!(
                    path = %path,
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying AI backend request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_request(&url, request).await {
                Ok(response) => {
                    let latency = start.elapsed();
                    info!(
                        path = %path,
                        latency_ms = latency.as_millis(),
                        "AI backend call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    let latency = start.elapsed();
                    error!(
                        path = %path,
                        error = %e,
                        latency_ms = latency.as_millis(),
                        retry = retries,
                        "AI backend call failed"
                    );
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(GatewayError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries,
        })
    }

    /// Execute a single request (internal)
    async fn execute_request<Req, Resp>(&self, url: &str, request: &Req) -> GatewayResult<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        debug!(url = %url, "Calling AI backend");

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    GatewayError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let envelope: ModelEnvelope<Resp> =
            response
                .json()
                .await
                .map_err(|e| GatewayError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        if !envelope.success {
            return Err(GatewayError::InvalidResponse {
                message: "Backend reported failure in response envelope".to_string(),
            });
        }

        Ok(envelope.data)
    }
}

#[async_trait]
impl ConversationGateway for HttpGateway {
    async fn send_chat(&self, assessment_id: &str, history: Vec<Turn>) -> GatewayResult<AiReply> {
        let request = ConversationRequest {
            assessment_id: assessment_id.to_string(),
            history,
        };
        self.call("/v1/chat", &request).await
    }

    async fn identify_body_part(
        &self,
        assessment_id: &str,
        submission: VideoSubmission,
    ) -> GatewayResult<AiReply> {
        let request = VideoRequest {
            assessment_id: assessment_id.to_string(),
            chat_history: submission.chat_history,
            video: submission.video,
        };
        self.call("/v1/video-identify", &request).await
    }

    async fn send_questionnaire(
        &self,
        assessment_id: &str,
        history: Vec<Turn>,
    ) -> GatewayResult<AiReply> {
        let request = ConversationRequest {
            assessment_id: assessment_id.to_string(),
            history,
        };
        self.call("/v1/questionnaire", &request).await
    }

    async fn analyze_dashboard(
        &self,
        assessment_id: &str,
        dashboard: serde_json::Value,
    ) -> GatewayResult<serde_json::Value> {
        let request = AnalysisRequest {
            assessment_id: assessment_id.to_string(),
            dashboard,
        };
        self.call("/v1/dashboard-analysis", &request).await
    }
}
