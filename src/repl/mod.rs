//! # REPL Adapter
//!
//! Line-oriented terminal front-end. Reads commands from stdin, turns them
//! into `core::Action`s, and runs the resulting effects on the tokio runtime.
//!
//! Backend calls run in spawned tasks that report back over a channel, so
//! the reducer stays the only writer of `App`. One request is in flight at a
//! time, and each request gets its own channel so a cancelled task can never
//! deliver into the next one. Ctrl+C while waiting aborts the request; Ctrl+C
//! at the prompt exits.

pub mod command;

use std::future::Future;
use std::io::{self, Write};
use std::path::PathBuf;

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::AbortHandle;

use crate::api::{self, ChatRequest, UploadFile};
use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::export;
use crate::core::session::Role;
use crate::core::state::App;
use crate::core::validate::UploadCandidate;
use command::{Command, HELP};

/// What handling one command produced.
#[derive(Debug, PartialEq)]
pub struct Outcome {
    pub effect: Effect,
    /// Text to show the user, if any.
    pub message: Option<String>,
    /// File to read when `effect` is `SpawnUpload`.
    pub upload_path: Option<PathBuf>,
}

impl Outcome {
    fn effect(effect: Effect) -> Self {
        Self {
            effect,
            message: None,
            upload_path: None,
        }
    }

    fn message(message: String) -> Self {
        Self {
            effect: Effect::None,
            message: Some(message),
            upload_path: None,
        }
    }
}

pub async fn run(config: ResolvedConfig) -> io::Result<()> {
    let backend = api::build_backend(&config)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    info!(
        "REPL starting with backend {} at {}",
        backend.name(),
        config.backend_url
    );
    let mut app = App::from_config(backend, &config);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!(
        "docchat: connected to {} ({})",
        config.backend_url,
        config.backend_mode.endpoint()
    );
    println!("{}", app.status_message);

    loop {
        print!("[{}] > ", app.sessions.active_index() + 1);
        io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = interrupted() => {
                println!();
                break;
            }
        };
        let Some(line) = line else {
            break;
        };

        let command = match command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        let outcome = handle_command(&mut app, command);
        if let Some(message) = &outcome.message {
            println!("{message}");
        }

        match outcome.effect {
            Effect::SpawnRequest => {
                let (tx, rx) = unbounded_channel();
                let handle = spawn_request(&app, tx);
                await_result(&mut app, rx, handle, interrupted()).await;
                println!("{}", render_reply(&app));
            }
            Effect::SpawnUpload => match outcome.upload_path {
                Some(path) => {
                    let (tx, rx) = unbounded_channel();
                    let handle = spawn_upload(&app, path, tx);
                    await_result(&mut app, rx, handle, interrupted()).await;
                    println!("{}", render_reply(&app));
                }
                None => {
                    warn!("Upload requested without a path");
                    update(&mut app, Action::Cancel);
                }
            },
            Effect::Quit => break,
            Effect::None => {}
        }
    }

    info!("REPL exiting");
    Ok(())
}

/// Applies one command to the app. Does no network I/O.
pub fn handle_command(app: &mut App, command: Command) -> Outcome {
    match command {
        Command::Ask(text) => Outcome::effect(update(app, Action::Submit(text))),
        Command::NewSession => {
            update(app, Action::NewSession);
            Outcome::message(app.status_message.clone())
        }
        Command::List => Outcome::message(session_list(app)),
        Command::Switch(index) => {
            update(app, Action::SwitchSession(index));
            Outcome::message(app.status_message.clone())
        }
        Command::Delete(index) => {
            update(app, Action::DeleteSession(index));
            Outcome::message(app.status_message.clone())
        }
        Command::Upload(path) => match UploadCandidate::from_path(&path) {
            Ok(candidate) => {
                let effect = update(app, Action::SelectFile(candidate));
                Outcome {
                    effect,
                    message: Some(app.status_message.clone()),
                    upload_path: (effect == Effect::SpawnUpload).then_some(path),
                }
            }
            Err(e) => Outcome::message(format!("Cannot read {}: {e}", path.display())),
        },
        Command::Export(path) => {
            match export::export_session(&path, app.sessions.active(), &app.formatter) {
                Ok(()) => Outcome::message(format!("Wrote {}", path.display())),
                Err(e) => Outcome::message(format!("Export failed: {e}")),
            }
        }
        Command::Help => Outcome::message(HELP.to_string()),
        Command::Quit => Outcome::effect(update(app, Action::Quit)),
    }
}

fn session_list(app: &App) -> String {
    let active = app.sessions.active_index();
    app.sessions
        .list()
        .iter()
        .enumerate()
        .map(|(i, session)| {
            let marker = if i == active { '*' } else { ' ' };
            format!(
                "{marker} {}. {} ({} messages)",
                i + 1,
                session.title(),
                session.messages.len()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolves on Ctrl+C. Never resolves if the signal handler can't be installed.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Feeds actions from the running task into the reducer until it settles,
/// or until `cancel` resolves. Consumes `rx`: once this returns, a late send
/// from an aborted task fails instead of reaching the next request.
async fn await_result(
    app: &mut App,
    mut rx: UnboundedReceiver<Action>,
    handle: AbortHandle,
    cancel: impl Future<Output = ()>,
) {
    tokio::pin!(cancel);
    while app.is_loading {
        tokio::select! {
            action = rx.recv() => match action {
                Some(action) => {
                    update(app, action);
                }
                None => break,
            },
            _ = &mut cancel => {
                handle.abort();
                update(app, Action::Cancel);
            }
        }
    }
}

/// The text shown after a request settles: the newest non-user message run
/// through the app's formatter, or the status line if there is none.
fn render_reply(app: &App) -> String {
    match app.sessions.active().messages.last() {
        Some(message) if message.role != Role::User => format!(
            "{}: {}",
            message.role.label(),
            app.formatter.format(&message.text)
        ),
        _ => app.status_message.clone(),
    }
}

fn spawn_request(app: &App, tx: UnboundedSender<Action>) -> AbortHandle {
    let backend = app.backend.clone();
    let session = app.sessions.active();
    let session_id = session.id.clone();
    let text = session
        .last_user_message()
        .map(|m| m.text.clone())
        .unwrap_or_default();

    info!("Spawning backend request for session {}", session_id);
    let handle = tokio::spawn(async move {
        let request = ChatRequest {
            session_id: &session_id,
            text: &text,
        };
        let action = match backend.send(request).await {
            Ok(answer) => Action::ResponseReceived {
                session_id: session_id.clone(),
                text: answer,
            },
            Err(e) => Action::RequestFailed {
                session_id: session_id.clone(),
                error: e.to_string(),
            },
        };
        if tx.send(action).is_err() {
            warn!("Failed to send backend result: receiver dropped");
        }
    });
    handle.abort_handle()
}

fn spawn_upload(app: &App, path: PathBuf, tx: UnboundedSender<Action>) -> AbortHandle {
    let backend = app.backend.clone();
    let (file_name, mime_type) = app
        .pending_upload
        .as_ref()
        .map(|c| (c.file_name.clone(), c.declared_mime_type.clone()))
        .unwrap_or_default();

    info!("Spawning upload of {}", path.display());
    let handle = tokio::spawn(async move {
        let action = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!("Read {} bytes from {}", bytes.len(), path.display());
                let file = UploadFile {
                    file_name: file_name.clone(),
                    mime_type,
                    bytes,
                };
                match backend.upload(file).await {
                    Ok(message) => Action::UploadFinished { file_name, message },
                    Err(e) => Action::UploadFailed {
                        file_name,
                        error: e.to_string(),
                    },
                }
            }
            Err(e) => Action::UploadFailed {
                file_name,
                error: format!("cannot read file: {e}"),
            },
        };
        if tx.send(action).is_err() {
            warn!("Failed to send upload result: receiver dropped");
        }
    });
    handle.abort_handle()
}
