//! # Transcript Export
//!
//! Writes a chat session as a standalone HTML page, every message run
//! through the [`TextFormatter`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::core::format::{TextFormatter, escape_html};
use crate::core::session::ChatSession;

const STYLE: &str = "\
body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; }
.message { margin: 1rem 0; padding: 0.75rem 1rem; border-radius: 0.5rem; }
.user { background: #e8f0fe; }
.assistant { background: #f4f4f4; }
.error { background: #fdecea; }
.role { font-weight: bold; margin-bottom: 0.25rem; }
.list-number { font-weight: bold; }
.bullet { margin-right: 0.25rem; }
";

/// Renders `session` as a complete HTML document.
pub fn render_transcript(session: &ChatSession, formatter: &TextFormatter) -> String {
    let title = escape_html(&session.title());
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{title}</title>\n<style>\n{STYLE}</style>\n"));
    html.push_str("</head>\n<body>\n");
    html.push_str(&format!("<h1>{title}</h1>\n"));

    for message in &session.messages {
        html.push_str(&format!(
            concat!(
                "<div class=\"message {}\">\n",
                "<div class=\"role\">{} <time>{}</time></div>\n",
                "<div class=\"body\">{}</div>\n</div>\n",
            ),
            message.role.css_class(),
            message.role.label(),
            message.sent_at.format("%Y-%m-%d %H:%M"),
            formatter.format(&message.text),
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Writes the rendered transcript to `path` (via `<path>.tmp` + rename).
pub fn export_session(
    path: &Path,
    session: &ChatSession,
    formatter: &TextFormatter,
) -> io::Result<()> {
    let html = render_transcript(session, formatter);
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, html)?;
    fs::rename(&tmp_path, path)?;
    info!(
        "Exported session {} ({} messages) to {}",
        session.id,
        session.messages.len(),
        path.display()
    );
    Ok(())
}

/// `report.html` → `report.html.tmp`, so no sibling file is clobbered.
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
