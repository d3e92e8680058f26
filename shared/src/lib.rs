//! # Chat Relay Shared Library
//!
//! Types and wire formats used by both ends of the datagram chat relay.
//!
//! ## Module Organization
//!
//! ### Codec Module (`codec`)
//! Turns a [`Message`] into the bytes of one datagram and back. Two formats
//! are available through [`WireFormat`]:
//! - `Delimited`: the six-field record joined by a private-use delimiter,
//!   byte-stuffed so that payload text can never split a field
//! - `Binary`: a length-prefixed serde encoding via `bincode`
//!
//! ### Roster Module (`roster`)
//! Encoding of the roster carried in the body of a `ListUpdate` message.
//!
//! ### Error Module (`error`)
//! The relay's error taxonomy: malformed messages, unknown recipients,
//! protocol violations and transport failures.

pub mod codec;
pub mod error;
pub mod roster;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use codec::{decode, encode, WireFormat};
pub use error::{ChatError, CodecError};
pub use roster::{decode_roster, encode_roster, encode_roster_capped, RosterEntry};

/// Separates the six fields of a delimited record.
pub const FIELD_DELIMITER: u8 = 0x01;
/// Separates the name, id and room of one roster entry.
pub const ROSTER_FIELD_DELIMITER: u8 = 0x02;
/// Terminates each roster entry.
pub const ROSTER_ENTRY_TERMINATOR: u8 = 0x03;
/// Precedes a literal reserved byte inside a field.
pub const ESCAPE_BYTE: u8 = 0x10;

/// Number of fields in a delimited record.
pub const FIELD_COUNT: usize = 6;
/// Largest encoded record accepted or produced.
///
/// Receivers read into a buffer one byte larger so that a truncated datagram
/// shows up as oversized instead of as a short record.
pub const MAX_DATAGRAM_SIZE: usize = 8192;
/// Sender id and name stamped on server-originated records.
pub const SERVER_ID: &str = "server";
/// Longest sender id, sender name, timestamp, target or room, in bytes.
///
/// Chat text in `body` is bounded by the datagram instead. Together with the
/// roster cap this keeps every record inside [`MAX_DATAGRAM_SIZE`].
pub const MAX_FIELD_LEN: usize = 64;

/// Delivery mode / purpose of a message.
///
/// The set is closed: every consumer matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Join,
    Leave,
    RoomChange,
    Broadcast,
    Multicast,
    Unicast,
    ListUpdate,
}

impl MessageKind {
    pub const ALL: [MessageKind; 7] = [
        MessageKind::Join,
        MessageKind::Leave,
        MessageKind::RoomChange,
        MessageKind::Broadcast,
        MessageKind::Multicast,
        MessageKind::Unicast,
        MessageKind::ListUpdate,
    ];

    /// Tag written in the kind field of a delimited record.
    pub fn tag(self) -> &'static str {
        match self {
            MessageKind::Join => "join",
            MessageKind::Leave => "close",
            MessageKind::RoomChange => "room",
            MessageKind::Broadcast => "broadcast",
            MessageKind::Multicast => "multicast",
            MessageKind::Unicast => "unicast",
            MessageKind::ListUpdate => "updateList",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, CodecError> {
        MessageKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| CodecError::UnknownKind(tag.to_string()))
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One chat record as carried in a single datagram.
///
/// `target` means a client id for `Unicast`, a room name for `Multicast`
/// and is empty otherwise. `RoomChange` carries the new room in `body`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub sender_id: String,
    pub sender_name: String,
    pub body: String,
    pub timestamp: String,
    pub target: String,
}

impl Message {
    /// Builds a message stamped with the current local time.
    pub fn new(
        kind: MessageKind,
        sender_id: impl Into<String>,
        sender_name: impl Into<String>,
        body: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            body: body.into(),
            timestamp: timestamp_now(),
            target: target.into(),
        }
    }

    /// Builds a record originated by the relay itself.
    pub fn from_server(kind: MessageKind, body: impl Into<String>) -> Self {
        Self::new(kind, SERVER_ID, SERVER_ID, body, "")
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Checks every bounded field against [`MAX_FIELD_LEN`].
    pub fn check_lengths(&self) -> Result<(), CodecError> {
        check_field_len("sender id", &self.sender_id)?;
        check_field_len("sender name", &self.sender_name)?;
        check_field_len("timestamp", &self.timestamp)?;
        check_field_len("target", &self.target)
    }
}

/// Rejects `value` if it is longer than [`MAX_FIELD_LEN`] bytes.
pub fn check_field_len(field: &'static str, value: &str) -> Result<(), CodecError> {
    if value.len() > MAX_FIELD_LEN {
        return Err(CodecError::FieldTooLong {
            field,
            len: value.len(),
            max: MAX_FIELD_LEN,
        });
    }
    Ok(())
}

/// Wall-clock time of day in `HH:MM:SS`, as shown next to chat lines.
pub fn timestamp_now() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
