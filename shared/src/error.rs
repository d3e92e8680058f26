//! Error taxonomy shared by the relay server and the client shell.

use thiserror::Error;

/// Reasons a datagram could not be turned back into a [`crate::Message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The record split into the wrong number of fields.
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    /// The kind tag is not one the protocol knows.
    #[error("unknown message kind `{0}`")]
    UnknownKind(String),

    #[error("record is not valid UTF-8")]
    InvalidUtf8,

    /// An escape byte was the last byte of the record.
    #[error("dangling escape byte at end of record")]
    DanglingEscape,

    /// Roster body ended in the middle of an entry.
    #[error("unterminated roster entry")]
    UnterminatedRosterEntry,

    /// A bounded field is longer than the protocol allows.
    #[error("{field} is {len} bytes, limit is {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// The whole record does not fit in one datagram.
    #[error("record is {len} bytes, limit is {max}")]
    Oversized { len: usize, max: usize },

    /// The length-prefixed binary frame could not be (de)serialized.
    #[error("binary frame: {0}")]
    Binary(String),
}

/// Per-message failures of the relay.
///
/// None of these are fatal to the server loop; the only error that stops the
/// process is a bind failure at startup, surfaced as [`ChatError::Transport`].
#[derive(Debug, Error)]
pub enum ChatError {
    /// Inbound datagram failed to decode. Dropped and logged.
    #[error("malformed message: {0}")]
    MalformedMessage(#[from] CodecError),

    /// Directed message names a client that is absent or no longer alive.
    #[error("unknown recipient `{0}`")]
    UnknownRecipient(String),

    /// Well-formed message that breaks the session protocol.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// Socket read/write failure.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_error_converts_to_malformed() {
        let err: ChatError = CodecError::FieldCount {
            expected: 6,
            found: 2,
        }
        .into();

        match err {
            ChatError::MalformedMessage(CodecError::FieldCount { expected, found }) => {
                assert_eq!(expected, 6);
                assert_eq!(found, 2);
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_error_display() {
        let err = ChatError::UnknownRecipient("a1b2c3".to_string());
        assert_eq!(err.to_string(), "unknown recipient `a1b2c3`");

        let err = ChatError::from(CodecError::Oversized {
            len: 9000,
            max: 8192,
        });
        assert_eq!(
            err.to_string(),
            "malformed message: record is 9000 bytes, limit is 8192"
        );

        let err = ChatError::from(CodecError::UnknownKind("shout".to_string()));
        assert_eq!(
            err.to_string(),
            "malformed message: unknown message kind `shout`"
        );
    }
}
