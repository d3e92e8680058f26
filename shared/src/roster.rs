//! Roster body carried by `ListUpdate` messages.
//!
//! Each entry is `name 0x02 id 0x02 room 0x03`, with the same byte-stuffing
//! rule as the outer record.

use crate::codec::{encode, escape_into, escaped_len, split_escaped, unescape, RECORD_RESERVED};
use crate::{
    check_field_len, CodecError, Message, MessageKind, ESCAPE_BYTE, MAX_DATAGRAM_SIZE,
    ROSTER_ENTRY_TERMINATOR, ROSTER_FIELD_DELIMITER,
};

const ROSTER_RESERVED: [u8; 3] = [ROSTER_FIELD_DELIMITER, ROSTER_ENTRY_TERMINATOR, ESCAPE_BYTE];
const ROSTER_FIELDS: usize = 3;

/// One alive session as listed in a roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub name: String,
    pub id: String,
    /// Empty when the session is in no room.
    pub room: String,
}

impl RosterEntry {
    pub fn new(name: impl Into<String>, id: impl Into<String>, room: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            room: room.into(),
        }
    }
}

pub fn encode_roster(entries: &[RosterEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        escape_into(&mut out, &entry.name, &ROSTER_RESERVED);
        out.push(ROSTER_FIELD_DELIMITER as char);
        escape_into(&mut out, &entry.id, &ROSTER_RESERVED);
        out.push(ROSTER_FIELD_DELIMITER as char);
        escape_into(&mut out, &entry.room, &ROSTER_RESERVED);
        out.push(ROSTER_ENTRY_TERMINATOR as char);
    }
    out
}

/// Encodes the longest prefix of `entries` whose `ListUpdate` fits in one
/// datagram.
///
/// Returns the body and the number of entries it lists. A binary record is
/// never larger than the delimited one, so the bound holds for both formats.
pub fn encode_roster_capped(entries: &[RosterEntry]) -> (String, usize) {
    let empty = encode(&Message::from_server(MessageKind::ListUpdate, "")).len();
    let mut budget = MAX_DATAGRAM_SIZE.saturating_sub(empty);
    let mut body = String::new();
    let mut listed = 0;

    for entry in entries {
        let chunk = encode_roster(std::slice::from_ref(entry));
        let cost = escaped_len(&chunk, &RECORD_RESERVED);
        if cost > budget {
            break;
        }
        budget -= cost;
        body.push_str(&chunk);
        listed += 1;
    }

    (body, listed)
}

pub fn decode_roster(body: &str) -> Result<Vec<RosterEntry>, CodecError> {
    let mut chunks = split_escaped(body, ROSTER_ENTRY_TERMINATOR)?;

    // Every entry is terminated, so the final chunk must be empty.
    match chunks.pop() {
        Some("") | None => {}
        Some(_) => return Err(CodecError::UnterminatedRosterEntry),
    }

    chunks
        .into_iter()
        .map(|chunk| {
            let fields = split_escaped(chunk, ROSTER_FIELD_DELIMITER)?;
            if fields.len() != ROSTER_FIELDS {
                return Err(CodecError::FieldCount {
                    expected: ROSTER_FIELDS,
                    found: fields.len(),
                });
            }
            let entry = RosterEntry {
                name: unescape(fields[0]),
                id: unescape(fields[1]),
                room: unescape(fields[2]),
            };
            check_field_len("roster name", &entry.name)?;
            check_field_len("roster id", &entry.id)?;
            check_field_len("roster room", &entry.room)?;
            Ok(entry)
        })
        .collect()
}
