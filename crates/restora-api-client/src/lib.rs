//! Shared HTTP client for the Restora backend.
//!
//! One client wraps every outbound call: it stamps the bearer token from the
//! shared session handle onto backend requests and inspects every backend
//! response for the authorization-rejection status, clearing the session in
//! exactly one place. Components never re-implement either side of that
//! contract.

pub mod api;
pub mod history;
pub mod pipeline;
pub mod session;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use restora_core::{ClientError, Config};

/// HTTP client for the Restora backend plus the externally-addressed blob
/// store.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store_url: Option<String>,
    sessions: SessionHandle,
}

impl ApiClient {
    /// No request timeout is configured: the upload stages are specified to
    /// hang rather than fabricate a client-side failure, and abandonment is
    /// handled by attempt invalidation instead of cancellation.
    pub fn new(config: &Config, sessions: SessionHandle) -> Result<Self, ClientError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            store_url: config.store_url.clone(),
            sessions,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn sessions(&self) -> &SessionHandle {
        &self.sessions
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.sessions.bearer_token() {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = self.build_url(path);
        let mut request = self.apply_auth(self.client.get(&url));

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = send(request).await?;
        read_json(self.check(response).await?).await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));

        let response = send(request).await?;
        read_json(self.check(response).await?).await
    }

    /// POST JSON body where only success/failure matters; the response body
    /// is discarded.
    pub async fn post_json_ack<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ClientError> {
        let url = self.build_url(path);
        let request = self.apply_auth(self.client.post(&url).json(body));

        let response = send(request).await?;
        self.check(response).await?;
        Ok(())
    }

    /// POST to the blob-store endpoint. The store is addressed by an
    /// absolute URL and carries no credentials, so its responses never feed
    /// the authorization interceptor: a rejection here is an ordinary
    /// transport error, as in the original's bare store call.
    pub(crate) async fn post_store<T: DeserializeOwned, B: Serialize>(
        &self,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.store_url.as_deref().ok_or_else(|| {
            ClientError::Config("RESTORA_STORE_URL is not configured".to_string())
        })?;

        let response = send(self.client.post(url).json(body)).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }
        read_json(response).await
    }

    /// Single response interceptor for the backend: the
    /// authorization-rejection status clears the session here, exactly once
    /// per rejected call, regardless of which component issued it.
    async fn check(&self, response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::debug!("Authorization rejected by backend; clearing session");
            self.sessions.clear();
            return Err(ClientError::Unauthorized(error_message(response).await));
        }
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(response).await,
            });
        }
        Ok(response)
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<Response, ClientError> {
    request
        .send()
        .await
        .map_err(|e| ClientError::Transport(format!("Failed to send request: {}", e)))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    response
        .json()
        .await
        .map_err(|e| ClientError::Transport(format!("Failed to parse response as JSON: {}", e)))
}

/// Extract the backend-provided message from an error response, falling back
/// to the raw body and then to a generic phrase.
async fn error_message(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<BackendMessage>,
    }

    // NestJS-style backends send either a single message or an array of
    // validation messages.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BackendMessage {
        One(String),
        Many(Vec<String>),
    }

    if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
        match body.message {
            Some(BackendMessage::One(message)) => return message,
            Some(BackendMessage::Many(messages)) if !messages.is_empty() => {
                return messages.join("; ")
            }
            _ => {}
        }
    }

    if !text.trim().is_empty() {
        return text;
    }
    format!("API request failed with status {}", status)
}

// Re-export the pieces consumers compose.
pub use api::{AuthResponse, RestorationApi};
pub use history::{HistoryView, JobHistory};
pub use pipeline::{UploadPipeline, UploadStage, UploadView};
pub use session::{FileTokenStore, MemoryTokenStore, SessionGuard, SessionHandle, TokenStore};
