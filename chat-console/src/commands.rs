//! Console input parsing.
//!
//! Plain lines (including `/sql …`-style directives) are questions; lines
//! starting with `:` are commands. Entry numbers are 1-based as displayed.

use std::path::PathBuf;

use crate::error_handler::{ConsoleError, ConsoleResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Question text, directive included.
    Ask(String),
    /// Ask related question `pick` of entry `entry` (both 0-based).
    Related { entry: usize, pick: usize },
    Clear,
    Upload {
        path: PathBuf,
        delimiter: char,
        description: String,
    },
    /// Empty list syncs everything.
    Sync(Vec<String>),
    Feedback {
        entry: usize,
        value: &'static str,
        details: Option<String>,
    },
    WhoAmI,
    Profile {
        instructions: String,
        details: String,
    },
    Config,
    Logout,
    Help,
    Quit,
}

pub const POSITIVE: &str = "positive";
pub const NEGATIVE: &str = "negative";

pub const HELP: &str = "\
Ask a question by typing it. Prefix with /sql or /data for data questions,
/metadata or /schema for metadata questions.

  :related <n> <k>                       ask related question k of answer n
  :clear                                 clear the conversation
  :upload <path> <delimiter> <description>
                                         upload a CSV file (delimiter ; , | or tab)
  :sync [vdb,vdb,...]                    resync vector stores (all if omitted)
  :feedback <n> <good|bad> [details]     rate answer n
  :whoami                                show the signed-in user
  :profile <instructions> | <details>    update custom instructions
  :config                                show backend feature flags
  :logout                                sign out and exit
  :help                                  this text
  :quit                                  exit";

/// Parses one input line; `Ok(None)` for a blank line.
///
/// # Errors
/// [`ConsoleError::Usage`] / [`ConsoleError::UnknownCommand`] for malformed commands.
pub fn parse_line(line: &str) -> ConsoleResult<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Some(Command::Ask(line.to_string())));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    let cmd = match name.to_ascii_lowercase().as_str() {
        "related" => {
            const USAGE: &str = ":related <n> <k>";
            let mut it = args.split_whitespace();
            let entry = it.next().and_then(entry_number).ok_or(ConsoleError::Usage(USAGE))?;
            let pick = it.next().and_then(entry_number).ok_or(ConsoleError::Usage(USAGE))?;
            Command::Related { entry, pick }
        }
        "clear" => Command::Clear,
        "upload" => parse_upload(args)?,
        "sync" => Command::Sync(
            args.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        "feedback" => parse_feedback(args)?,
        "whoami" => Command::WhoAmI,
        "profile" => {
            let (instructions, details) = args.split_once('|').unwrap_or((args, ""));
            Command::Profile {
                instructions: instructions.trim().to_string(),
                details: details.trim().to_string(),
            }
        }
        "config" => Command::Config,
        "logout" => Command::Logout,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(ConsoleError::UnknownCommand(format!(":{other}"))),
    };
    Ok(Some(cmd))
}

/// 1-based display number to 0-based index.
fn entry_number(s: &str) -> Option<usize> {
    s.parse::<usize>().ok().and_then(|n| n.checked_sub(1))
}

fn parse_upload(args: &str) -> ConsoleResult<Command> {
    const USAGE: &str = ":upload <path> <delimiter> <description>";
    let mut parts = args.splitn(3, char::is_whitespace);
    let path = parts.next().filter(|p| !p.is_empty()).ok_or(ConsoleError::Usage(USAGE))?;
    let delimiter = match parts.next() {
        Some("tab" | "\\t") => '\t',
        Some(d) if d.chars().count() == 1 => d.chars().next().ok_or(ConsoleError::Usage(USAGE))?,
        _ => return Err(ConsoleError::Usage(USAGE)),
    };
    let description = parts.next().map(str::trim).unwrap_or_default();
    if description.is_empty() {
        return Err(ConsoleError::Usage(USAGE));
    }
    Ok(Command::Upload {
        path: PathBuf::from(path),
        delimiter,
        description: description.to_string(),
    })
}

fn parse_feedback(args: &str) -> ConsoleResult<Command> {
    const USAGE: &str = ":feedback <n> <good|bad> [details]";
    let mut parts = args.splitn(3, char::is_whitespace);
    let entry = parts.next().and_then(entry_number).ok_or(ConsoleError::Usage(USAGE))?;
    let value = match parts.next().map(str::to_ascii_lowercase).as_deref() {
        Some("good" | "up" | "+" | "positive") => POSITIVE,
        Some("bad" | "down" | "-" | "negative") => NEGATIVE,
        _ => return Err(ConsoleError::Usage(USAGE)),
    };
    let details = parts
        .next()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    Ok(Command::Feedback {
        entry,
        value,
        details,
    })
}
