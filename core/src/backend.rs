use crate::protocol::{ChatReply, ChatRequest};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Http,
    Mock,
}

impl BackendKind {
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("http") {
            Some(Self::Http)
        } else if value.eq_ignore_ascii_case("mock") {
            Some(Self::Mock)
        } else {
            None
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend responded with status {0}")]
    Status(StatusCode),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Unavailable(String),
}

impl BackendError {
    /// Human readable reason, if the error carries one.
    pub fn description(&self) -> Option<String> {
        let text = self.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, BackendError>;
}

#[derive(Clone)]
pub struct BackendDriver {
    kind: BackendKind,
    backend: Arc<dyn ChatBackend>,
}

impl BackendDriver {
    pub fn new(kind: BackendKind, backend: Arc<dyn ChatBackend>) -> Self {
        Self { kind, backend }
    }

    pub fn with_kind(kind: BackendKind, endpoint: &Url) -> Result<Self, BackendError> {
        match kind {
            BackendKind::Http => Ok(Self::new(kind, Arc::new(HttpBackend::new(endpoint.clone())?))),
            BackendKind::Mock => Ok(Self::fake()),
        }
    }

    pub fn fake() -> Self {
        Self::new(BackendKind::Mock, Arc::new(MockBackend::default()))
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub async fn send(&self, request: &ChatRequest) -> Result<ChatReply, BackendError> {
        self.backend.send(request).await
    }
}

pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpBackend {
    pub fn new(endpoint: Url) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dwgpt/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, BackendError> {
        tracing::debug!(endpoint = %self.endpoint, "posting chat request");
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        // The backend reports application failures in the body, so it is
        // decoded whatever the status code says.
        match serde_json::from_slice::<ChatReply>(&body) {
            Ok(reply) => {
                tracing::debug!(%status, ok = reply.ok, "chat reply decoded");
                Ok(reply)
            }
            Err(_) if !status.is_success() => Err(BackendError::Status(status)),
            Err(err) => Err(BackendError::Decode(err)),
        }
    }
}

/// In-process backend that plays back scripted replies, then echoes.
#[derive(Default)]
pub struct MockBackend {
    script: Mutex<VecDeque<Result<ChatReply, BackendError>>>,
    requests: Mutex<Vec<ChatRequest>>,
    delay: Option<Duration>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_reply(&self, reply: ChatReply) {
        self.script.lock().push_back(Ok(reply));
    }

    pub fn push_error(&self, error: BackendError) {
        self.script.lock().push_back(Err(error));
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, BackendError> {
        self.requests.lock().push(request.clone());
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        let scripted = self.script.lock().pop_front();
        match scripted {
            Some(result) => result,
            None => Ok(echo_reply(request)),
        }
    }
}

fn echo_reply(request: &ChatRequest) -> ChatReply {
    let conversation_id = request
        .conversation_id
        .clone()
        .unwrap_or_else(|| format!("mock-{}", Uuid::new_v4()));
    ChatReply::text(format!("[Mock] received '{}'.", request.message))
        .with_conversation_id(conversation_id)
}
