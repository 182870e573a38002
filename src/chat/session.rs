use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Conversation history per user, capped at `max_history` messages.
#[derive(Clone)]
pub struct ChatSessions {
    sessions: Arc<RwLock<HashMap<Uuid, Vec<ChatMessage>>>>,
    max_history: usize,
}

impl ChatSessions {
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_history: max_history.max(2),
        }
    }

    pub async fn history(&self, user: Uuid) -> Vec<ChatMessage> {
        self.sessions.read().await.get(&user).cloned().unwrap_or_default()
    }

    /// Appends a question and its answer, dropping the oldest messages past the cap.
    pub async fn record(&self, user: Uuid, question: ChatMessage, answer: ChatMessage) {
        let mut sessions = self.sessions.write().await;
        let history = sessions.entry(user).or_default();
        history.push(question);
        history.push(answer);
        if history.len() > self.max_history {
            let excess = history.len() - self.max_history;
            history.drain(..excess);
        }
    }

    pub async fn clear(&self, user: Uuid) {
        self.sessions.write().await.remove(&user);
    }
}
