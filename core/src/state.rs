use crate::backend::BackendDriver;
use crate::classify::{classify, failure_notice, SERVER_FAILURE_FALLBACK};
use crate::protocol::{ChatRequest, Record};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub const GREETING: &str = "Hi 👋 I'm DW-GPT. Your company's AI data assistant. Ask me about shipments, tasks, or anything else!";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Record>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Value>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
            data: None,
            intent: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn with_data(mut self, data: Option<Vec<Record>>) -> Self {
        self.data = data;
        self
    }

    pub fn with_intent(mut self, intent: Option<Value>) -> Self {
        self.intent = intent;
        self
    }

    /// Records worth showing as a table, if any.
    pub fn records(&self) -> Option<&[Record]> {
        self.data
            .as_deref()
            .filter(|records| !records.is_empty())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SendError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("a request is already in flight")]
    Busy,
}

/// Read-only view of a session handed to front ends.
#[derive(Debug, Clone)]
pub struct ConversationSnapshot {
    pub messages: Vec<ChatMessage>,
    pub conversation_id: Option<String>,
    pub pending: bool,
}

/// One conversation with the assistant backend.
///
/// Clones share the same transcript; create a new session for an independent
/// conversation.
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<RwLock<InnerState>>,
    backend: BackendDriver,
}

struct InnerState {
    messages: Vec<ChatMessage>,
    conversation_id: Option<String>,
    pending: bool,
}

impl InnerState {
    fn seeded() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
            conversation_id: None,
            pending: false,
        }
    }
}

impl ChatSession {
    pub fn new(backend: BackendDriver) -> Self {
        Self {
            inner: Arc::new(RwLock::new(InnerState::seeded())),
            backend,
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.inner.read().messages.clone()
    }

    pub fn conversation_id(&self) -> Option<String> {
        self.inner.read().conversation_id.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.inner.read().pending
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        let inner = self.inner.read();
        ConversationSnapshot {
            messages: inner.messages.clone(),
            conversation_id: inner.conversation_id.clone(),
            pending: inner.pending,
        }
    }

    /// Run one round trip and return the assistant message it appended.
    ///
    /// Backend failures never surface as `Err`; they become an assistant
    /// message. `Err` only reports a send that was refused outright.
    pub async fn send(&self, text: impl Into<String>) -> Result<ChatMessage, SendError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SendError::EmptyMessage);
        }

        let (request, _pending) = {
            let mut inner = self.inner.write();
            if inner.pending {
                return Err(SendError::Busy);
            }
            inner.pending = true;
            inner.messages.push(ChatMessage::user(text.clone()));
            (
                ChatRequest::new(text, inner.conversation_id.clone()),
                PendingGuard {
                    inner: self.inner.clone(),
                },
            )
        };

        let (message, conversation_id) = match self.backend.send(&request).await {
            Ok(reply) if reply.ok => {
                let classified = classify(&reply);
                let message = ChatMessage::assistant(classified.content)
                    .with_data(classified.data)
                    .with_intent(reply.intent);
                (message, reply.conversation_id)
            }
            Ok(reply) => {
                let reason = reply.error_reason().unwrap_or(SERVER_FAILURE_FALLBACK);
                tracing::warn!(%reason, "backend rejected request");
                (ChatMessage::assistant(failure_notice(Some(reason))), None)
            }
            Err(err) => {
                tracing::error!(%err, "chat round trip failed");
                let detail = err.description();
                (ChatMessage::assistant(failure_notice(detail.as_deref())), None)
            }
        };

        {
            let mut inner = self.inner.write();
            if conversation_id.is_some() {
                inner.conversation_id = conversation_id;
            }
            inner.messages.push(message.clone());
        }
        Ok(message)
    }
}

// Clears the in-flight flag on every exit path, including a dropped future.
struct PendingGuard {
    inner: Arc<RwLock<InnerState>>,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.inner.write().pending = false;
    }
}
