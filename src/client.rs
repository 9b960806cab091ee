use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::config::ServiceConfig;
use crate::error::AppError;
use crate::models::{ChatReply, ChatTurn, HealthResponse, Session, SessionDetail};

// ============================================================================
// Helper
// ============================================================================

fn transport_err(e: reqwest::Error) -> AppError {
    AppError::Transport(e.to_string())
}

// ============================================================================
// RemoteService trait
// ============================================================================

/// The request/response contract of the PC builder service.
///
/// Every call is a single exchange: no retries, no caching. `send_chat_turn`
/// is not idempotent, so callers must never re-issue it on failure.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// `GET /api/sessions`
    async fn list_sessions(&self) -> Result<Vec<Session>, AppError>;

    /// `GET /api/sessions/{id}`
    async fn get_session_detail(&self, id: &str) -> Result<SessionDetail, AppError>;

    /// `POST /api/chat`. With `session_id = None` the service creates a session.
    async fn send_chat_turn(
        &self,
        session_id: Option<&str>,
        message: &str,
    ) -> Result<ChatReply, AppError>;

    /// `GET /health`
    async fn health(&self) -> Result<HealthResponse, AppError>;
}

// ============================================================================
// ServiceClient
// ============================================================================

/// HTTP client for the PC builder service.
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    /// Build a client for `config.base_url`.
    ///
    /// No request timeout is set: a turn can take as long as the assistant
    /// needs, and an issued request always runs to completion.
    pub fn new(config: &ServiceConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    // --------------------------------------------------------------------
    // Private HTTP helpers
    // --------------------------------------------------------------------

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send a request, surface non-success bodies verbatim, and decode JSON.
    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, AppError> {
        let resp = req.send().await.map_err(transport_err)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(status = %status, "Service returned an error response");
            return Err(AppError::Service { status, body });
        }

        let bytes = resp.bytes().await.map_err(transport_err)?;
        serde_json::from_slice(&bytes).map_err(|e| AppError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RemoteService for ServiceClient {
    async fn list_sessions(&self) -> Result<Vec<Session>, AppError> {
        tracing::debug!("GET /api/sessions");
        self.send_json(self.request(reqwest::Method::GET, "/api/sessions"))
            .await
    }

    async fn get_session_detail(&self, id: &str) -> Result<SessionDetail, AppError> {
        tracing::debug!(session_id = %id, "GET /api/sessions/{{id}}");
        let path = format!("/api/sessions/{}", urlencoding::encode(id));
        self.send_json(self.request(reqwest::Method::GET, &path))
            .await
    }

    async fn send_chat_turn(
        &self,
        session_id: Option<&str>,
        message: &str,
    ) -> Result<ChatReply, AppError> {
        tracing::debug!(session_id = ?session_id, "POST /api/chat");
        let req = self
            .request(reqwest::Method::POST, "/api/chat")
            .json(&ChatTurn { session_id, message });
        self.send_json(req).await
    }

    async fn health(&self) -> Result<HealthResponse, AppError> {
        self.send_json(self.request(reqwest::Method::GET, "/health"))
            .await
    }
}
