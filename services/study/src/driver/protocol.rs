//! services/study/src/driver/protocol.rs
//!
//! Defines the line protocol between a front end (a terminal, or a renderer
//! attached to stdin/stdout) and the session driver.

use serde::{Deserialize, Serialize};
use study_core::domain::{GestureVector, Rating, SessionSummary};
use uuid::Uuid;

//=========================================================================================
// Commands Sent TO the Driver
//=========================================================================================

/// What the user asked for, after parsing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Flip,
    Rate(Rating),
    Next,
    Swipe(GestureVector),
    Quit,
}

/// The JSON form of a command, one object per line.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Flip,
    Rate { rating: WireRating },
    Next,
    Swipe { dx: f64, dy: f64 },
    Quit,
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(rename_all = "snake_case")]
enum WireRating {
    Again,
    Hard,
    Good,
    Easy,
}

impl From<WireRating> for Rating {
    fn from(rating: WireRating) -> Self {
        match rating {
            WireRating::Again => Rating::Again,
            WireRating::Hard => Rating::Hard,
            WireRating::Good => Rating::Good,
            WireRating::Easy => Rating::Easy,
        }
    }
}

impl From<ClientMessage> for Command {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::Flip => Command::Flip,
            ClientMessage::Rate { rating } => Command::Rate(rating.into()),
            ClientMessage::Next => Command::Next,
            ClientMessage::Swipe { dx, dy } => Command::Swipe(GestureVector::new(dx, dy)),
            ClientMessage::Quit => Command::Quit,
        }
    }
}

/// Parses one input line: either a JSON message or a keyboard shortcut.
///
/// Shortcuts: `space`/`f` flip, `1`-`4` rate, `n` next, `q` quit, `s <dx> <dy>` swipe.
/// An empty line (a bare Enter) flips, like tapping the card.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let trimmed = line.trim();
    if trimmed.starts_with('{') {
        return serde_json::from_str::<ClientMessage>(trimmed)
            .map(Command::from)
            .map_err(|e| format!("invalid message: {}", e));
    }

    let mut parts = trimmed.split_whitespace();
    let head = parts.next().unwrap_or("").to_ascii_lowercase();
    let command = match head.as_str() {
        "" | "f" | "flip" | "space" => Command::Flip,
        "n" | "next" => Command::Next,
        "q" | "quit" | "exit" => Command::Quit,
        "s" | "swipe" => {
            let mut coord = |name: &str| {
                parts
                    .next()
                    .and_then(|v| v.parse::<f64>().ok())
                    .ok_or_else(|| format!("swipe needs a numeric {}", name))
            };
            let dx = coord("dx")?;
            let dy = coord("dy")?;
            Command::Swipe(GestureVector::new(dx, dy))
        }
        "r" | "rate" => {
            let rating = parts.next().ok_or("rate needs a rating")?;
            Command::Rate(rating.parse()?)
        }
        other => Command::Rate(
            other
                .parse::<Rating>()
                .map_err(|_| format!("unknown command '{}'", other))?,
        ),
    };

    if parts.next().is_some() {
        return Err(format!("unexpected input after '{}'", head));
    }
    Ok(command)
}

//=========================================================================================
// Events Sent FROM the Driver
//=========================================================================================

/// Everything the driver reports back to the front end.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        deck: String,
        mode: String,
        total: usize,
    },
    CardShown {
        position: usize,
        total: usize,
        percent: u8,
        front: String,
    },
    Flipped {
        /// The back of the card when flipped to it, `None` when flipped back.
        back: Option<String>,
    },
    Rated {
        card_id: i64,
        rating: String,
        /// Only set when the rating was submitted for scheduling.
        quality: Option<u8>,
    },
    Notice {
        message: String,
    },
    SessionEnded {
        completed: bool,
        reviewed: usize,
        total: usize,
        again: u32,
        hard: u32,
        good: u32,
        easy: u32,
        submitted: usize,
        duration_secs: i64,
    },
    Error {
        message: String,
    },
}

impl Event {
    pub fn session_ended(summary: &SessionSummary) -> Self {
        Event::SessionEnded {
            completed: summary.completed,
            reviewed: summary.reviewed,
            total: summary.total,
            again: summary.ratings.again,
            hard: summary.ratings.hard,
            good: summary.ratings.good,
            easy: summary.ratings.easy,
            submitted: summary.submitted,
            duration_secs: (summary.finished_at - summary.started_at).num_seconds(),
        }
    }

    /// Human-readable rendering for terminal output.
    pub fn render_text(&self) -> String {
        match self {
            Event::SessionStarted {
                deck, mode, total, ..
            } => format!("== {} ({} mode, {} cards) ==", deck, mode, total),
            Event::CardShown {
                position,
                total,
                percent,
                front,
            } => format!("[{} / {}  {}%]\nQ: {}", position, total, percent, front),
            Event::Flipped { back: Some(back) } => format!("A: {}", back),
            Event::Flipped { back: None } => "(front)".to_string(),
            Event::Rated {
                rating, quality, ..
            } => match quality {
                Some(q) => format!("Rated {} (quality {})", rating, q),
                None => format!("Rated {}", rating),
            },
            Event::Notice { message } => format!("* {}", message),
            Event::SessionEnded {
                completed,
                reviewed,
                total,
                again,
                hard,
                good,
                easy,
                ..
            } => {
                let head = if *completed { "Session complete" } else { "Session ended" };
                format!(
                    "{}: {}/{} cards (again {}, hard {}, good {}, easy {})",
                    head, reviewed, total, again, hard, good, easy
                )
            }
            Event::Error { message } => format!("! {}", message),
        }
    }
}
