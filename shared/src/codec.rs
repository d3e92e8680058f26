//! Wire codec: one [`Message`] per datagram.
//!
//! The delimited format is the six-field record
//!
//! ```text
//! senderID 0x01 kind 0x01 senderName 0x01 body 0x01 timestamp 0x01 target
//! ```
//!
//! A literal reserved byte inside a field is preceded by [`ESCAPE_BYTE`], so
//! payload text can never change the field count. Text without reserved bytes
//! encodes exactly as the unescaped legacy framing.

use crate::{
    CodecError, Message, MessageKind, ESCAPE_BYTE, FIELD_COUNT, FIELD_DELIMITER, MAX_DATAGRAM_SIZE,
};
use bincode::Options;
use std::fmt;
use std::str::FromStr;

/// Bytes that must be escaped inside a field of the outer record.
pub(crate) const RECORD_RESERVED: [u8; 2] = [FIELD_DELIMITER, ESCAPE_BYTE];

/// Selectable encoding for datagrams on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    /// Byte-stuffed delimited record, compatible with plain-text peers.
    #[default]
    Delimited,
    /// Length-prefixed serde encoding of the whole message.
    Binary,
}

impl WireFormat {
    /// Encodes one datagram, refusing records the receiver would reject.
    pub fn encode(self, message: &Message) -> Result<Vec<u8>, CodecError> {
        message.check_lengths()?;
        let bytes = match self {
            WireFormat::Delimited => encode(message),
            WireFormat::Binary => binary_options()
                .serialize(message)
                .map_err(|e| CodecError::Binary(e.to_string()))?,
        };
        check_size(bytes.len())?;
        Ok(bytes)
    }

    pub fn decode(self, bytes: &[u8]) -> Result<Message, CodecError> {
        match self {
            WireFormat::Delimited => decode(bytes),
            WireFormat::Binary => {
                check_size(bytes.len())?;
                let message: Message = binary_options()
                    .deserialize(bytes)
                    .map_err(|e| CodecError::Binary(e.to_string()))?;
                message.check_lengths()?;
                Ok(message)
            }
        }
    }
}

impl FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "delimited" => Ok(WireFormat::Delimited),
            "binary" => Ok(WireFormat::Binary),
            other => Err(format!(
                "unknown wire format `{}` (expected `delimited` or `binary`)",
                other
            )),
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireFormat::Delimited => f.write_str("delimited"),
            WireFormat::Binary => f.write_str("binary"),
        }
    }
}

fn binary_options() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_DATAGRAM_SIZE as u64)
}

fn check_size(len: usize) -> Result<(), CodecError> {
    if len > MAX_DATAGRAM_SIZE {
        return Err(CodecError::Oversized {
            len,
            max: MAX_DATAGRAM_SIZE,
        });
    }
    Ok(())
}

/// Encodes a message as a delimited record.
///
/// No limits are applied here; [`WireFormat::encode`] checks them.
pub fn encode(message: &Message) -> Vec<u8> {
    let fields = [
        message.sender_id.as_str(),
        message.kind.tag(),
        message.sender_name.as_str(),
        message.body.as_str(),
        message.timestamp.as_str(),
        message.target.as_str(),
    ];

    let mut out = String::with_capacity(fields.iter().map(|f| f.len() + 1).sum());
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(FIELD_DELIMITER as char);
        }
        escape_into(&mut out, field, &RECORD_RESERVED);
    }
    out.into_bytes()
}

/// Decodes a delimited record, checking size, arity, the kind tag and field
/// lengths.
pub fn decode(bytes: &[u8]) -> Result<Message, CodecError> {
    check_size(bytes.len())?;
    let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
    let fields = split_escaped(text, FIELD_DELIMITER)?;

    if fields.len() != FIELD_COUNT {
        return Err(CodecError::FieldCount {
            expected: FIELD_COUNT,
            found: fields.len(),
        });
    }

    let message = Message {
        sender_id: unescape(fields[0]),
        kind: MessageKind::from_tag(&unescape(fields[1]))?,
        sender_name: unescape(fields[2]),
        body: unescape(fields[3]),
        timestamp: unescape(fields[4]),
        target: unescape(fields[5]),
    };
    message.check_lengths()?;
    Ok(message)
}

/// Appends `field` to `out`, escaping every byte listed in `reserved`.
///
/// `reserved` must only hold ASCII bytes, which keeps the output valid UTF-8.
pub(crate) fn escape_into(out: &mut String, field: &str, reserved: &[u8]) {
    for ch in field.chars() {
        if ch.is_ascii() && reserved.contains(&(ch as u8)) {
            out.push(ESCAPE_BYTE as char);
        }
        out.push(ch);
    }
}

/// Length of `text` once every byte in `reserved` is escaped.
pub(crate) fn escaped_len(text: &str, reserved: &[u8]) -> usize {
    text.len() + text.bytes().filter(|b| reserved.contains(b)).count()
}

/// Splits on every `delimiter` not preceded by an escape byte.
///
/// Segments are returned still escaped so callers can split them again on an
/// inner delimiter before calling [`unescape`].
pub(crate) fn split_escaped(text: &str, delimiter: u8) -> Result<Vec<&str>, CodecError> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut escaped = false;

    for (i, byte) in text.bytes().enumerate() {
        if escaped {
            escaped = false;
        } else if byte == ESCAPE_BYTE {
            escaped = true;
        } else if byte == delimiter {
            segments.push(&text[start..i]);
            start = i + 1;
        }
    }

    if escaped {
        return Err(CodecError::DanglingEscape);
    }

    segments.push(&text[start..]);
    Ok(segments)
}

/// Removes one level of escaping. Input must come from [`split_escaped`].
pub(crate) fn unescape(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut escaped = false;

    for ch in segment.chars() {
        if !escaped && ch == ESCAPE_BYTE as char {
            escaped = true;
            continue;
        }
        escaped = false;
        out.push(ch);
    }
    out
}
