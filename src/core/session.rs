//! # Chat Sessions
//!
//! In-memory conversations. A [`SessionStore`] owns an ordered list of
//! [`ChatSession`]s and remembers which one is active. It is never empty:
//! deleting the last session replaces it with a fresh one.
//!
//! Sessions live as long as the process. Use `core::export` to keep a
//! rendered copy of one.

use chrono::{DateTime, Utc};
use log::debug;

const MAX_TITLE_CHARS: usize = 60;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    /// A failed request, shown inline in the conversation.
    Error,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Assistant => "Assistant",
            Role::Error => "Error",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: new_session_id(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            role,
            text: text.into(),
            sent_at: Utc::now(),
        });
    }

    /// The most recent user message, if any.
    pub fn last_user_message(&self) -> Option<&ChatMessage> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    pub fn title(&self) -> String {
        derive_title(&self.messages)
    }
}

/// Generate a new UUID v4 session ID.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Derive a title from the first user message in the conversation.
/// Returns the first line, truncated to 60 chars.
pub fn derive_title(messages: &[ChatMessage]) -> String {
    for message in messages {
        if message.role == Role::User {
            let first_line = message.text.lines().next().unwrap_or("").trim();
            if first_line.chars().count() > MAX_TITLE_CHARS {
                let head: String = first_line.chars().take(MAX_TITLE_CHARS - 3).collect();
                return format!("{head}...");
            }
            return first_line.to_string();
        }
    }
    "New chat".to_string()
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Vec<ChatSession>,
    active_id: String,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// A store holding one empty, active session.
    pub fn new() -> Self {
        let session = ChatSession::new();
        Self {
            active_id: session.id.clone(),
            sessions: vec![session],
        }
    }

    /// Sessions in creation order.
    pub fn list(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    pub fn active_index(&self) -> usize {
        self.index_of(&self.active_id).unwrap_or(0)
    }

    pub fn active(&self) -> &ChatSession {
        &self.sessions[self.active_index()]
    }

    pub fn active_mut(&mut self) -> &mut ChatSession {
        let index = self.active_index();
        &mut self.sessions[index]
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Appends a new empty session and makes it active.
    pub fn new_session(&mut self) -> &ChatSession {
        let session = ChatSession::new();
        debug!("New session {}", session.id);
        self.active_id = session.id.clone();
        self.sessions.push(session);
        &self.sessions[self.sessions.len() - 1]
    }

    /// Activates the session at `index`. Returns false if there is none.
    pub fn switch(&mut self, index: usize) -> bool {
        match self.sessions.get(index) {
            Some(session) => {
                self.active_id = session.id.clone();
                true
            }
            None => false,
        }
    }

    /// Removes the session at `index`.
    ///
    /// If it was active, the session now at `index` (or the new last one)
    /// becomes active. Removing the only session leaves a fresh empty one.
    pub fn delete(&mut self, index: usize) -> Option<ChatSession> {
        if index >= self.sessions.len() {
            return None;
        }
        let removed = self.sessions.remove(index);
        debug!("Deleted session {}", removed.id);

        if self.sessions.is_empty() {
            self.sessions.push(ChatSession::new());
        }
        if removed.id == self.active_id {
            let next = index.min(self.sessions.len() - 1);
            self.active_id = self.sessions[next].id.clone();
        }
        Some(removed)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }
}
