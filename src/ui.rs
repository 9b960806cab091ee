//! Terminal presentation.
//!
//! Render functions are pure (state in, text out). `Screen` turns a stream of
//! synchronizer snapshots into incremental output, and `parse_intent` maps an
//! input line to the operation it requests. Nothing here mutates app state.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::export::format_price;
use crate::models::{Build, Message, Role, Session};
use crate::sync::AppState;

/// Starter prompts offered on an empty conversation.
pub const SUGGESTIONS: [&str; 4] = [
    "I have $1500 for a gaming PC",
    "Build me a workstation for coding",
    "Budget around $2000, 1440p gaming",
    "Cheapest build that can run modern games",
];

pub const HELP: &str = "\
Commands:
  /new              start a new chat
  /sessions         list recent chats
  /open <n|id>      open a chat from the list
  /build            show the current build
  /export [dir]     save the build summary as pc-build.txt
  /suggest <n>      send one of the starter suggestions
  /help             show this help
  /quit             exit
Anything else is sent as a message.";

// ============================================================================
// Intents
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Send(String),
    NewSession,
    ListSessions,
    Open(String),
    ShowBuild,
    Export(Option<PathBuf>),
    Suggest(usize),
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_intent(line: &str) -> Intent {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return Intent::Send(line.to_string());
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "new" => Intent::NewSession,
        "sessions" | "ls" => Intent::ListSessions,
        "open" if !arg.is_empty() => Intent::Open(arg.to_string()),
        "build" => Intent::ShowBuild,
        "export" => Intent::Export((!arg.is_empty()).then(|| PathBuf::from(arg))),
        "suggest" => match arg.parse::<usize>() {
            Ok(n) if (1..=SUGGESTIONS.len()).contains(&n) => Intent::Suggest(n),
            _ => Intent::Unknown(trimmed.to_string()),
        },
        "help" | "?" => Intent::Help,
        "quit" | "exit" | "q" => Intent::Quit,
        _ => Intent::Unknown(trimmed.to_string()),
    }
}

/// Resolve `/open` input: a 1-based position in the list, or a session id.
pub fn resolve_session<'a>(arg: &str, sessions: &'a [Session]) -> Option<&'a str> {
    if let Ok(n) = arg.parse::<usize>() {
        if let Some(s) = n.checked_sub(1).and_then(|i| sessions.get(i)) {
            return Some(&s.id);
        }
    }
    sessions.iter().find(|s| s.id == arg).map(|s| s.id.as_str())
}

// ============================================================================
// Rendering
// ============================================================================

pub fn date_label(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - ts).num_hours();
    if hours < 24 {
        "Today".to_string()
    } else if hours < 48 {
        "Yesterday".to_string()
    } else {
        ts.format("%Y-%m-%d").to_string()
    }
}

pub fn session_title(session: &Session) -> &str {
    if session.title.trim().is_empty() {
        "New build"
    } else {
        &session.title
    }
}

pub fn render_session_list(state: &AppState, now: DateTime<Utc>) -> String {
    if state.sessions.is_empty() {
        return "No chats yet".to_string();
    }
    let mut out = String::from("Recent");
    for (i, session) in state.sessions.iter().enumerate() {
        let marker = if state.active_session_id.as_deref() == Some(session.id.as_str()) {
            '*'
        } else {
            ' '
        };
        out.push_str(&format!(
            "\n{marker} {:>2}. {}  ({})",
            i + 1,
            session_title(session),
            date_label(session.updated_at, now)
        ));
    }
    out
}

pub fn render_welcome() -> String {
    let mut out = String::from(
        "What do you want to build?\n\
         Share your budget and how you'll use the PC. I'll suggest parts and show the total with tax.",
    );
    for (i, text) in SUGGESTIONS.iter().enumerate() {
        out.push_str(&format!("\n  /suggest {}  {}", i + 1, text));
    }
    out
}

pub fn render_message(message: &Message) -> String {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    format!("[{who}] {}", message.content)
}

pub fn render_build_card(build: &Build) -> String {
    let category_width = build
        .parts
        .iter()
        .map(|p| p.category.chars().count())
        .chain(std::iter::once("Category".len()))
        .max()
        .unwrap_or(0);
    let name_width = build
        .parts
        .iter()
        .map(|p| p.name.chars().count())
        .chain(std::iter::once("Part".len()))
        .max()
        .unwrap_or(0);

    let mut out = String::from("Build summary");
    out.push_str(&format!(
        "\n{:<cw$}  {:<nw$}  {:>10}",
        "Category",
        "Part",
        "Price",
        cw = category_width,
        nw = name_width
    ));
    for part in &build.parts {
        out.push_str(&format!(
            "\n{:<cw$}  {:<nw$}  {:>10}",
            part.category,
            part.name,
            format_price(part.price),
            cw = category_width,
            nw = name_width
        ));
        if let Some(link) = &part.link {
            out.push_str(&format!("\n{:<cw$}  {}", "", link, cw = category_width));
        }
    }
    out.push_str(&format!(
        "\nSubtotal {}  Tax {:.1}%  Total {}",
        format_price(build.subtotal),
        build.tax_rate * 100.0,
        format_price(build.total)
    ));
    out
}

pub fn render_error_banner(error: &str) -> String {
    format!("! {error}")
}

// ============================================================================
// Screen
// ============================================================================

/// A new chat just got its first reply and, with it, a session id.
fn first_turn_landed(prev: &AppState, next: &AppState) -> bool {
    prev.active_session_id.is_none()
        && prev.transcript.is_empty()
        && prev.in_flight
        && !next.in_flight
        && next.transcript.len() == 2
}

/// Incremental renderer: remembers the last state it drew and emits only what
/// changed.
#[derive(Default)]
pub struct Screen {
    last: Option<AppState>,
}

impl Screen {
    pub fn update(&mut self, next: &AppState) -> Vec<String> {
        let mut out = Vec::new();
        let prev = self.last.take();

        let same_conversation = prev.as_ref().is_some_and(|p| {
            p.transcript.len() <= next.transcript.len()
                && p.transcript[..] == next.transcript[..p.transcript.len()]
                && (p.active_session_id == next.active_session_id
                    || first_turn_landed(p, next))
        });

        if same_conversation {
            let seen = prev.as_ref().map_or(0, |p| p.transcript.len());
            out.extend(next.transcript[seen..].iter().map(render_message));
        } else {
            out.push(match &next.active_session_id {
                Some(id) => format!("── chat {id} ──"),
                None => "── new chat ──".to_string(),
            });
            if next.transcript.is_empty() {
                out.push(render_welcome());
            } else {
                out.extend(next.transcript.iter().map(render_message));
            }
        }

        let prev_build = prev.as_ref().and_then(|p| p.active_build.as_ref());
        if let Some(build) = &next.active_build {
            if !same_conversation || prev_build != Some(build) {
                out.push(render_build_card(build));
            }
        }

        let was_in_flight = prev.as_ref().is_some_and(|p| p.in_flight);
        if next.in_flight && !was_in_flight {
            out.push("… waiting for reply".to_string());
        }

        let prev_error = prev.as_ref().and_then(|p| p.last_error.as_ref());
        if let Some(error) = &next.last_error {
            if prev_error != Some(error) {
                out.push(render_error_banner(error));
            }
        }

        self.last = Some(next.clone());
        out
    }
}
