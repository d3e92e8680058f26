//! Line input handling for the chat client
//!
//! Turns each submitted line into the actions the shell should take. Lines
//! starting with `/` are commands that change the delivery mode or room;
//! anything else is chat text sent according to the current mode.
//!
//! | command     | effect                                   |
//! |-------------|------------------------------------------|
//! | `/g`        | send to everyone                         |
//! | `/r`        | send to the current room                 |
//! | `/w:<id>`   | send to one client                       |
//! | `/j:<room>` | join a room (tells the server)           |
//! | `/l`        | leave the current room (tells the server)|
//! | `/q`        | leave the chat and quit                  |

use rand::Rng;
use shared::{Message, MessageKind, MAX_FIELD_LEN};

/// Where plain text is currently sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Global,
    Room,
    Direct(String),
}

/// What the shell should do in response to a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Transmit to the server
    Send(Message),
    /// Show locally as our own message; the server does not echo it back
    LocalEcho(Message),
    /// Feedback for the user, never transmitted
    Notice(String),
    Quit,
}

/// Client-side session state: identity, delivery mode and current room
pub struct ChatInput {
    id: String,
    name: String,
    mode: Mode,
    room: String,
}

impl ChatInput {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mode: Mode::Global,
            room: String::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    /// Prompt label for the current mode, e.g. `/g`, `/r:game`, `/w:a1b2c3`
    pub fn mode_label(&self) -> String {
        match &self.mode {
            Mode::Global => "/g".to_string(),
            Mode::Room => format!("/r:{}", self.room),
            Mode::Direct(id) => format!("/w:{}", id),
        }
    }

    pub fn join_message(&self) -> Message {
        self.message(MessageKind::Join, "join", "")
    }

    pub fn leave_message(&self) -> Message {
        self.message(MessageKind::Leave, "close", "")
    }

    pub fn submit(&mut self, line: &str) -> Vec<Action> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return Vec::new();
        }

        if line.starts_with('/') {
            return self.command(line);
        }

        match &self.mode {
            Mode::Global => vec![Action::Send(
                self.message(MessageKind::Broadcast, line, ""),
            )],
            Mode::Room if self.room.is_empty() => vec![Action::Notice(
                "You are not in a room; join one with /j:<room>".to_string(),
            )],
            Mode::Room => vec![Action::Send(
                self.message(MessageKind::Multicast, line, &self.room),
            )],
            Mode::Direct(target) => {
                let msg = self.message(MessageKind::Unicast, line, target);
                vec![Action::Send(msg.clone()), Action::LocalEcho(msg)]
            }
        }
    }

    fn command(&mut self, line: &str) -> Vec<Action> {
        let (command, arg) = match line.split_once(':') {
            Some((command, arg)) => (command, Some(arg.trim())),
            None => (line.trim(), None),
        };

        match (command, arg) {
            ("/g", None) => {
                self.mode = Mode::Global;
                vec![Action::Notice("Mode: everyone".to_string())]
            }
            ("/r", None) => {
                self.mode = Mode::Room;
                if self.room.is_empty() {
                    vec![Action::Notice(
                        "Mode: room (join one with /j:<room>)".to_string(),
                    )]
                } else {
                    vec![Action::Notice(format!("Mode: room {}", self.room))]
                }
            }
            ("/w", Some(id)) | ("/j", Some(id)) if id.len() > MAX_FIELD_LEN => {
                vec![Action::Notice(format!(
                    "Names are limited to {} bytes",
                    MAX_FIELD_LEN
                ))]
            }
            ("/w", Some(id)) if !id.is_empty() => {
                self.mode = Mode::Direct(id.to_string());
                vec![Action::Notice(format!("Mode: direct to {}", id))]
            }
            ("/j", Some(room)) if !room.is_empty() => {
                self.room = room.to_string();
                let change = self.message(MessageKind::RoomChange, room, "");
                vec![
                    Action::Send(change),
                    Action::Notice(format!("Joined room {}", room)),
                ]
            }
            ("/l", None) => {
                self.room.clear();
                vec![
                    Action::Send(self.message(MessageKind::RoomChange, "", "")),
                    Action::Notice("Left room".to_string()),
                ]
            }
            ("/q", None) => vec![Action::Send(self.leave_message()), Action::Quit],
            ("/w", _) => usage("/w:<id>"),
            ("/j", _) => usage("/j:<room>"),
            _ => vec![Action::Notice(format!("Unknown command {}", line))],
        }
    }

    fn message(&self, kind: MessageKind, body: &str, target: &str) -> Message {
        Message::new(kind, self.id.as_str(), self.name.as_str(), body, target)
    }
}

fn usage(form: &str) -> Vec<Action> {
    vec![Action::Notice(format!("Usage: {}", form))]
}

/// Six random hex digits, used when no id is given on the command line
pub fn generate_client_id() -> String {
    let value: u32 = rand::thread_rng().gen_range(0..0x100_0000);
    format!("{:06x}", value)
}
