//! # Actions
//!
//! Everything that can happen in docchat becomes an `Action`.
//! User types a question? That's `Action::Submit(text)`.
//! Backend answers? That's `Action::ResponseReceived { .. }`.
//!
//! The `update()` function takes the current state and an action, mutates
//! the state, and returns an `Effect` describing the I/O the caller should
//! start. No side effects here. I/O happens elsewhere.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info, warn};

use crate::core::session::Role;
use crate::core::state::App;
use crate::core::validate::UploadCandidate;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// User submitted a question in the active session.
    Submit(String),
    ResponseReceived { session_id: String, text: String },
    RequestFailed { session_id: String, error: String },
    /// User picked a file to upload.
    SelectFile(UploadCandidate),
    UploadFinished { file_name: String, message: String },
    UploadFailed { file_name: String, error: String },
    /// User aborted the request in flight.
    Cancel,
    NewSession,
    SwitchSession(usize),
    DeleteSession(usize),
    Quit,
}

/// Work the caller must start after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Send the active session's last user message to the backend.
    SpawnRequest,
    /// Send `app.pending_upload` to the backend.
    SpawnUpload,
    Quit,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    debug!("update: {:?}", action);
    match action {
        Action::Submit(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Effect::None;
            }
            if app.is_loading {
                app.status_message = "Still waiting for the previous answer...".to_string();
                return Effect::None;
            }
            app.sessions.active_mut().push(Role::User, text);
            app.is_loading = true;
            app.status_message = "Thinking...".to_string();
            Effect::SpawnRequest
        }
        Action::ResponseReceived { session_id, text } => {
            app.is_loading = false;
            match app.sessions.get_mut(&session_id) {
                Some(session) => {
                    session.push(Role::Assistant, text);
                    app.status_message = "Ready".to_string();
                }
                None => {
                    warn!("Dropping answer for deleted session {}", session_id);
                    app.status_message = "Answer arrived for a deleted chat".to_string();
                }
            }
            Effect::None
        }
        Action::RequestFailed { session_id, error } => {
            app.is_loading = false;
            info!("Request failed: {}", error);
            if let Some(session) = app.sessions.get_mut(&session_id) {
                session.push(Role::Error, error.clone());
            } else {
                warn!("Dropping error for deleted session {}", session_id);
            }
            app.status_message = format!("Request failed: {error}");
            Effect::None
        }
        Action::SelectFile(candidate) => {
            // A new selection clears whatever the last one left behind.
            app.upload_error = None;
            app.pending_upload = None;
            if app.is_loading {
                app.status_message = "Wait for the current request before uploading".to_string();
                return Effect::None;
            }
            match app.upload_policy.validate(&candidate).reason() {
                None => {
                    app.status_message = format!("Uploading {}...", candidate.file_name);
                    app.pending_upload = Some(candidate);
                    app.is_loading = true;
                    Effect::SpawnUpload
                }
                Some(reason) => {
                    info!("Rejected upload {}: {}", candidate.file_name, reason);
                    app.status_message = reason.clone();
                    app.upload_error = Some(reason);
                    Effect::None
                }
            }
        }
        Action::UploadFinished { file_name, message } => {
            app.is_loading = false;
            app.pending_upload = None;
            app.sessions.active_mut().push(Role::Assistant, message);
            app.status_message = format!("Uploaded {file_name}");
            Effect::None
        }
        Action::UploadFailed { file_name, error } => {
            app.is_loading = false;
            app.pending_upload = None;
            app.status_message = format!("Upload of {file_name} failed: {error}");
            app.upload_error = Some(error);
            Effect::None
        }
        Action::Cancel => {
            if app.is_loading {
                app.is_loading = false;
                app.pending_upload = None;
                app.status_message = "Cancelled".to_string();
            }
            Effect::None
        }
        Action::NewSession => {
            app.sessions.new_session();
            app.status_message = "Started a new chat".to_string();
            Effect::None
        }
        Action::SwitchSession(index) => {
            if app.sessions.switch(index) {
                app.status_message = format!("Switched to chat {}", index + 1);
            } else {
                app.status_message = format!("No chat {}", index + 1);
            }
            Effect::None
        }
        Action::DeleteSession(index) => {
            match app.sessions.delete(index) {
                Some(removed) => {
                    app.status_message = format!("Deleted \"{}\"", removed.title());
                }
                None => {
                    app.status_message = format!("No chat {}", index + 1);
                }
            }
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}
