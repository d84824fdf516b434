//! Parsing of REPL input lines into commands.

use std::fmt;
use std::path::PathBuf;

pub const HELP: &str = "\
Type a question and press Enter. Commands:
  /new           start a new chat
  /list          list chats
  /switch N      switch to chat N
  /delete N      delete chat N
  /upload PATH   validate and upload a document
  /export PATH   write the current chat as HTML
  /help          show this help
  /quit          exit
Ctrl+C cancels the request in flight, or exits at the prompt.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    NewSession,
    List,
    /// Zero-based session index.
    Switch(usize),
    /// Zero-based session index.
    Delete(usize),
    Upload(PathBuf),
    Export(PathBuf),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Unknown(String),
    MissingArgument(&'static str),
    BadIndex(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Unknown(name) => write!(f, "unknown command /{name} (try /help)"),
            CommandError::MissingArgument(what) => write!(f, "missing argument: {what}"),
            CommandError::BadIndex(raw) => write!(f, "not a chat number: {raw}"),
        }
    }
}

impl std::error::Error for CommandError {}

/// Parses one input line. Blank lines yield `Ok(None)`.
///
/// Chat numbers are shown to users starting at 1 and returned zero-based.
pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Ask(line.to_string())));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    let command = match name {
        "new" => Command::NewSession,
        "list" | "ls" => Command::List,
        "switch" => Command::Switch(index(arg)?),
        "delete" | "rm" => Command::Delete(index(arg)?),
        "upload" => Command::Upload(path(arg, "file path")?),
        "export" => Command::Export(path(arg, "output path")?),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn index(arg: &str) -> Result<usize, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument("chat number"));
    }
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CommandError::BadIndex(arg.to_string())),
    }
}

fn path(arg: &str, what: &'static str) -> Result<PathBuf, CommandError> {
    if arg.is_empty() {
        Err(CommandError::MissingArgument(what))
    } else {
        Ok(PathBuf::from(arg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_question() {
        assert_eq!(
            parse("  what is **this**?  "),
            Ok(Some(Command::Ask("what is **this**?".to_string())))
        );
    }

    #[test]
    fn test_blank_line() {
        assert_eq!(parse("   "), Ok(None));
    }

    #[test]
    fn test_indices_are_one_based() {
        assert_eq!(parse("/switch 1"), Ok(Some(Command::Switch(0))));
        assert_eq!(parse("/delete 3"), Ok(Some(Command::Delete(2))));
        assert_eq!(
            parse("/switch 0"),
            Err(CommandError::BadIndex("0".to_string()))
        );
        assert_eq!(
            parse("/switch two"),
            Err(CommandError::BadIndex("two".to_string()))
        );
        assert_eq!(
            parse("/delete"),
            Err(CommandError::MissingArgument("chat number"))
        );
    }

    #[test]
    fn test_paths_keep_inner_spaces() {
        assert_eq!(
            parse("/upload  My Report.pdf "),
            Ok(Some(Command::Upload(PathBuf::from("My Report.pdf"))))
        );
        assert_eq!(
            parse("/export"),
            Err(CommandError::MissingArgument("output path"))
        );
    }

    #[test]
    fn test_help_mentions_ctrl_c() {
        assert!(HELP.contains("Ctrl+C cancels the request in flight"));
    }

    #[test]
    fn test_aliases_and_unknown() {
        assert_eq!(parse("/exit"), Ok(Some(Command::Quit)));
        assert_eq!(parse("/ls"), Ok(Some(Command::List)));
        assert_eq!(parse("/new"), Ok(Some(Command::NewSession)));
        assert_eq!(
            parse("/frobnicate"),
            Err(CommandError::Unknown("frobnicate".to_string()))
        );
    }
}
