//! Integration tests for the AI backend gateway
//!
//! Uses wiremock to simulate the model backend.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use physio_assess::config::{GatewayConfig, RequestConfig};
use physio_assess::error::GatewayError;
use physio_assess::gateway::{ConversationGateway, HttpGateway, Turn, VideoSubmission};

/// Create a gateway client pointed at a mock server
fn create_test_gateway(base_url: &str) -> HttpGateway {
    let config = GatewayConfig {
        api_key: "test_key".to_string(),
        base_url: base_url.to_string(),
    };
    let request_config = RequestConfig {
        timeout_ms: 5000,
        max_retries: 2,
        retry_delay_ms: 10,
    };
    HttpGateway::new(&config, request_config).expect("Failed to create gateway")
}

#[cfg(test)]
mod chat_tests {
    use super::*;

    #[tokio::test]
    async fn test_send_chat_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .and(header("Authorization", "Bearer test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "message": "Where exactly does it hurt?"
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let gateway = create_test_gateway(&mock_server.uri());
        let history = vec![Turn::user("my knee hurts")];

        let reply = gateway.send_chat("assessment-1", history).await.unwrap();

        assert!(!reply.has_action());
        assert_eq!(reply.body["message"], "Where exactly does it hurt?");
    }

    #[tokio::test]
    async fn test_send_chat_forwards_history() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .and(body_partial_json(json!({
                "assessment_id": "assessment-1",
                "history": [{"role": "user", "content": "my knee hurts"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "message": "Noted." }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let gateway = create_test_gateway(&mock_server.uri());
        let history = vec![Turn::user("my knee hurts")];

        let result = gateway.send_chat("assessment-1", history).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_reply_action_signal_parsed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/questionnaire"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "message": "Thanks, let's continue.",
                    "action": "show_questionnaire"
                }
            })))
            .mount(&mock_server)
            .await;

        let gateway = create_test_gateway(&mock_server.uri());

        let reply = gateway
            .send_questionnaire("assessment-1", vec![Turn::user("done")])
            .await
            .unwrap();

        assert!(reply.has_action());
    }
}

#[cfg(test)]
mod video_tests {
    use super::*;

    #[tokio::test]
    async fn test_identify_body_part_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/video-identify"))
            .and(body_partial_json(json!({ "video": "YmFzZTY0" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "message": "I can see your left knee.",
                    "body_part": "knee"
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let gateway = create_test_gateway(&mock_server.uri());
        let submission = VideoSubmission {
            chat_history: vec![Turn::user("showing you now")],
            video: "YmFzZTY0".to_string(),
        };

        let reply = gateway
            .identify_body_part("assessment-1", submission)
            .await
            .unwrap();

        assert_eq!(reply.body["body_part"], "knee");
    }
}

#[cfg(test)]
mod dashboard_tests {
    use super::*;

    #[tokio::test]
    async fn test_analyze_dashboard_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/dashboard-analysis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "severity": "moderate",
                    "recommendation": "physio 2x weekly"
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let gateway = create_test_gateway(&mock_server.uri());

        let analysis = gateway
            .analyze_dashboard("assessment-1", json!({"questions": [], "rom_records": []}))
            .await
            .unwrap();

        assert_eq!(analysis["severity"], "moderate");
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[tokio::test]
    async fn test_retries_then_unavailable() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            // initial attempt + max_retries
            .expect(3)
            .mount(&mock_server)
            .await;

        let gateway = create_test_gateway(&mock_server.uri());

        let result = gateway.send_chat("assessment-1", vec![]).await;

        match result {
            Err(GatewayError::Unavailable { retries, .. }) => assert_eq!(retries, 3),
            other => panic!("Expected Unavailable error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_envelope_failure_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "data": {}
            })))
            .mount(&mock_server)
            .await;

        let gateway = create_test_gateway(&mock_server.uri());

        let result = gateway.send_chat("assessment-1", vec![]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let gateway = create_test_gateway(&mock_server.uri());

        let result = gateway.send_chat("assessment-1", vec![]).await;
        assert!(result.is_err());
    }
}
