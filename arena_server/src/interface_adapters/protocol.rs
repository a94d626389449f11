// Wire protocol for the line-based TCP session.
// Inbound: one display name line, then one move token per line.
// Outbound: one JSON object per line, tagged by `state`.

use crate::domain::{Grid, MoveIntent, SnakeId};
use crate::use_cases::{ConnectionId, Notice, Standing};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const PROTOCOL_VERSION: u8 = 1;
pub const MAX_NAME_CHARS: usize = 32;

/// A malformed inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    Empty,
    UnknownToken(String),
    TooLong { limit: usize },
    InvalidUtf8,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Empty => write!(f, "empty line"),
            ProtocolError::UnknownToken(token) => write!(
                f,
                "unknown move {token:?}; expected Left, Right or Forward"
            ),
            ProtocolError::TooLong { limit } => write!(f, "line longer than {limit} bytes"),
            ProtocolError::InvalidUtf8 => write!(f, "line is not valid UTF-8"),
        }
    }
}

impl FromStr for MoveIntent {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        match line {
            "Left" => Ok(MoveIntent::Left),
            "Right" => Ok(MoveIntent::Right),
            "Forward" => Ok(MoveIntent::Forward),
            "" => Err(ProtocolError::Empty),
            other => Err(ProtocolError::UnknownToken(truncate(other, 32))),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Cleans a handshake name: control characters dropped, whitespace collapsed,
/// length capped. Returns `None` when nothing printable is left.
pub fn parse_display_name(line: &str) -> Option<String> {
    let printable: String = line.chars().filter(|c| !c.is_control()).collect();
    let cleaned = printable.split_whitespace().collect::<Vec<_>>().join(" ");
    if cleaned.is_empty() {
        return None;
    }
    Some(truncate(&cleaned, MAX_NAME_CHARS))
}

/// Every outbound line carries the protocol version beside the message.
#[derive(Debug, Serialize)]
pub struct Envelope<'a> {
    pub v: u8,
    #[serde(flatten)]
    pub message: ServerMessage<'a>,
}

/// Messages the server sends to connected clients, one per line.
#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ServerMessage<'a> {
    // Handshake accepted; the id is what control calls refer to.
    Waiting {
        id: ConnectionId,
        name: &'a str,
    },
    Subscribed {
        room_id: &'a str,
    },
    Unsubscribed,
    // Match started; `id` is the recipient's snake.
    Start {
        id: SnakeId,
    },
    Playing {
        tick: u64,
        map: &'a Grid,
        alive: bool,
        score: u32,
    },
    Dead {
        tick: u64,
        map: &'a Grid,
        score: u32,
    },
    Spectating {
        tick: u64,
        map: &'a Grid,
    },
    Done {
        scores: &'a BTreeMap<SnakeId, u32>,
    },
    Reset,
    Rejected {
        reason: &'a str,
    },
    Error {
        msg: &'a str,
    },
}

impl<'a> From<&'a Notice> for ServerMessage<'a> {
    fn from(notice: &'a Notice) -> Self {
        match notice {
            Notice::Waiting {
                connection_id,
                name,
            } => ServerMessage::Waiting {
                id: *connection_id,
                name,
            },
            Notice::Subscribed { room_id } => ServerMessage::Subscribed { room_id },
            Notice::Unsubscribed => ServerMessage::Unsubscribed,
            Notice::Start { snake_id } => ServerMessage::Start { id: *snake_id },
            Notice::Tick { record, standing } => match *standing {
                Standing::Alive { score } => ServerMessage::Playing {
                    tick: record.tick,
                    map: &record.map,
                    alive: true,
                    score,
                },
                Standing::Dead { score } => ServerMessage::Dead {
                    tick: record.tick,
                    map: &record.map,
                    score,
                },
                Standing::Spectator => ServerMessage::Spectating {
                    tick: record.tick,
                    map: &record.map,
                },
            },
            Notice::Done { scores } => ServerMessage::Done { scores },
            Notice::Reset => ServerMessage::Reset,
            Notice::Rejected(rejection) => ServerMessage::Rejected {
                reason: rejection.reason(),
            },
            Notice::Error { msg } => ServerMessage::Error { msg },
        }
    }
}

/// Serializes a notice as one newline-terminated JSON line.
pub fn encode_notice(notice: &Notice) -> Result<String, serde_json::Error> {
    let envelope = Envelope {
        v: PROTOCOL_VERSION,
        message: ServerMessage::from(notice),
    };
    let mut line = serde_json::to_string(&envelope)?;
    line.push('\n');
    Ok(line)
}
