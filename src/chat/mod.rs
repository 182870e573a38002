//! Assistant chat proxy.
//!
//! Each authenticated user has one conversation held in [`ChatSessions`].
//! Prompts are assembled server-side and sent to a [`ChatBackend`]; the
//! production backend is Gemini `generateContent`.

pub mod gemini;
pub mod prompt;
pub mod session;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::models::User;

pub use gemini::GeminiBackend;
pub use session::{ChatMessage, ChatRole, ChatSessions};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("The farming assistant is not configured on this server")]
    NotConfigured,

    #[error("assistant backend failed: {0}")]
    Upstream(String),
}

/// Generates a reply for a fully assembled prompt.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    pub language: Option<String>,
    pub region: Option<String>,
}

#[derive(Clone)]
pub struct ChatService {
    backend: Option<Arc<dyn ChatBackend>>,
    sessions: ChatSessions,
}

impl ChatService {
    pub fn new(backend: Option<Arc<dyn ChatBackend>>, max_history: usize) -> Self {
        Self {
            backend,
            sessions: ChatSessions::new(max_history),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn history(&self, user: &User) -> Vec<ChatMessage> {
        self.sessions.history(user.id).await
    }

    pub async fn clear(&self, user: &User) {
        self.sessions.clear(user.id).await;
    }

    /// Sends one message; the exchange is recorded only when the backend answers.
    pub async fn send(&self, user: &User, request: ChatRequest) -> Result<ChatMessage, ChatError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let backend = self.backend.as_ref().ok_or(ChatError::NotConfigured)?;

        let history = self.sessions.history(user.id).await;
        let prompt = prompt::build_prompt(
            user.role,
            request.region.as_deref(),
            request.language.as_deref(),
            &history,
            message,
        );

        let reply = backend.generate(&prompt).await?;
        let reply = ChatMessage::assistant(reply.trim());
        self.sessions.record(user.id, ChatMessage::user(message), reply.clone()).await;
        Ok(reply)
    }
}
