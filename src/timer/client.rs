//! HTTP client for the pomodoro timer service.
//!
//! | Call     | Route                   | Success body              |
//! |----------|-------------------------|---------------------------|
//! | status   | `GET  /pomodoro/status` | [`TimerStatus`]           |
//! | start    | `POST /pomodoro/start`  | `{"status": "running"}`   |
//! | stop     | `POST /pomodoro/stop`   | `{"status": "stopped"}`   |

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::config::TimerConfig;

use super::state::TimerStatus;

/// Upper bound on one request; keeps a hung service from stalling the poll
/// loop indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// TimerError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TimerError {
    #[error("timer request failed: {0}")]
    Request(String),

    #[error("timer service returned status {0}")]
    Status(u16),

    #[error("failed to parse timer response: {0}")]
    Parse(String),

    /// A start/stop answer carried some other `status` string.
    #[error("timer service answered with status {0:?}")]
    UnexpectedStatus(String),

    /// Commands are refused while an error is showing or a request is in
    /// flight, and after the sync loop has stopped.
    #[error("timer is not ready for commands")]
    Unavailable,
}

impl From<reqwest::Error> for TimerError {
    fn from(e: reqwest::Error) -> Self {
        TimerError::Request(e.to_string())
    }
}

#[derive(Deserialize)]
struct CommandResponse {
    status: String,
}

// ---------------------------------------------------------------------------
// TimerClient
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct TimerClient {
    client: reqwest::Client,
    base_url: String,
}

impl TimerClient {
    pub fn from_config(config: &TimerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn status(&self) -> Result<TimerStatus, TimerError> {
        let response = self
            .client
            .get(format!("{}/pomodoro/status", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TimerError::Status(response.status().as_u16()));
        }
        response
            .json()
            .await
            .map_err(|e| TimerError::Parse(e.to_string()))
    }

    pub async fn start(&self) -> Result<(), TimerError> {
        self.command("start", "running").await
    }

    pub async fn stop(&self) -> Result<(), TimerError> {
        self.command("stop", "stopped").await
    }

    async fn command(&self, route: &str, expected: &str) -> Result<(), TimerError> {
        let response = self
            .client
            .post(format!("{}/pomodoro/{route}", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(TimerError::Status(response.status().as_u16()));
        }
        let body: CommandResponse = response
            .json()
            .await
            .map_err(|e| TimerError::Parse(e.to_string()))?;
        if body.status != expected {
            return Err(TimerError::UnexpectedStatus(body.status));
        }
        log::info!("timer: {route} acknowledged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TimerClient {
        TimerClient::from_config(&TimerConfig {
            base_url: format!("{}/", server.uri()),
            ..TimerConfig::default()
        })
    }

    #[tokio::test]
    async fn status_parses_null_start_time() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pomodoro/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "is_active": false, "is_break": false, "start_time": null
            })))
            .mount(&server)
            .await;

        let status = client_for(&server).status().await.unwrap();
        assert!(!status.is_active);
        assert_eq!(status.start_time, None);
    }

    #[tokio::test]
    async fn status_error_code_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pomodoro/status"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).status().await.unwrap_err();
        assert!(matches!(err, TimerError::Status(503)));
    }

    #[tokio::test]
    async fn start_expects_running() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pomodoro/start"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Pomodoro timer started", "status": "running"
            })))
            .mount(&server)
            .await;

        client_for(&server).start().await.unwrap();
    }

    #[tokio::test]
    async fn stop_with_wrong_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pomodoro/stop"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "running" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).stop().await.unwrap_err();
        assert!(matches!(err, TimerError::UnexpectedStatus(ref s) if s == "running"));
    }

    #[tokio::test]
    async fn unreachable_service_is_request_error() {
        let client = TimerClient::from_config(&TimerConfig {
            base_url: "http://127.0.0.1:9".into(),
            ..TimerConfig::default()
        });
        let err = client.status().await.unwrap_err();
        assert!(matches!(err, TimerError::Request(_)));
    }
}
