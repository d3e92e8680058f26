//! Text rendering of received messages
//!
//! Chat lines follow the layout `HH:MM:SS   (/g)   <name>    text`; the
//! mode marker tells the reader how the line was delivered.

use shared::{decode_roster, Message, MessageKind, RosterEntry};

const GAP: &str = "   ";

/// Lines to print for a message received from the server
///
/// Returns nothing for kinds that carry no text for the user.
pub fn render(message: &Message, own_id: &str) -> Vec<String> {
    let ts = &message.timestamp;
    match message.kind {
        // Session changes arrive as the roster that follows them
        MessageKind::Join | MessageKind::Leave | MessageKind::RoomChange => Vec::new(),
        MessageKind::Broadcast => {
            let who = if message.sender_id == own_id {
                "me"
            } else {
                message.sender_name.as_str()
            };
            vec![chat_line(ts, "(/g)", who, &message.body)]
        }
        MessageKind::Multicast => {
            let who = format!("{}->{}", message.sender_name, message.target);
            vec![chat_line(ts, "(/r)", &who, &message.body)]
        }
        MessageKind::Unicast => vec![chat_line(ts, "(/w)", &message.sender_name, &message.body)],
        MessageKind::ListUpdate => match decode_roster(&message.body) {
            Ok(entries) => render_roster(&entries),
            Err(e) => vec![format!("Roster unavailable: {}", e)],
        },
    }
}

/// Our own directed message, shown locally since the server sends it only to
/// the target
pub fn render_echo(message: &Message) -> String {
    chat_line(&message.timestamp, "(/w)", "me", &message.body)
}

pub fn render_roster(entries: &[RosterEntry]) -> Vec<String> {
    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push("ID      UserName      Room".to_string());
    for entry in entries {
        lines.push(format!("{}  {}  {}", entry.id, entry.name, entry.room));
    }
    lines
}

fn chat_line(ts: &str, marker: &str, who: &str, body: &str) -> String {
    format!("{}{}{}{}<{}>    {}", ts, GAP, marker, GAP, who, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::encode_roster;

    fn msg(kind: MessageKind, id: &str, name: &str, body: &str, target: &str) -> Message {
        Message::new(kind, id, name, body, target).with_timestamp("15:04:05")
    }

    #[test]
    fn test_broadcast_from_other() {
        let lines = render(&msg(MessageKind::Broadcast, "u1", "Alice", "hi", ""), "u2");
        assert_eq!(lines, vec!["15:04:05   (/g)   <Alice>    hi"]);
    }

    #[test]
    fn test_broadcast_from_self() {
        let lines = render(&msg(MessageKind::Broadcast, "u1", "Alice", "hi", ""), "u1");
        assert_eq!(lines, vec!["15:04:05   (/g)   <me>    hi"]);
    }

    #[test]
    fn test_multicast() {
        let lines = render(&msg(MessageKind::Multicast, "u1", "Alice", "go", "game"), "u2");
        assert_eq!(lines, vec!["15:04:05   (/r)   <Alice->game>    go"]);
    }

    #[test]
    fn test_unicast_and_echo() {
        let m = msg(MessageKind::Unicast, "u1", "Alice", "psst", "u2");
        assert_eq!(render(&m, "u2"), vec!["15:04:05   (/w)   <Alice>    psst"]);
        assert_eq!(render_echo(&m), "15:04:05   (/w)   <me>    psst");
    }

    #[test]
    fn test_roster() {
        let body = encode_roster(&[
            RosterEntry::new("Alice", "u1", "game"),
            RosterEntry::new("Bob", "u2", ""),
        ]);
        let lines = render(&Message::from_server(MessageKind::ListUpdate, body), "u1");

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "u1  Alice  game");
        assert_eq!(lines[2], "u2  Bob  ");
    }

    #[test]
    fn test_broken_roster() {
        let lines = render(
            &Message::from_server(MessageKind::ListUpdate, "Alice\x02u1"),
            "u1",
        );
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("Roster unavailable"));
    }

    #[test]
    fn test_session_changes_render_nothing() {
        for (kind, body) in [
            (MessageKind::Join, "join"),
            (MessageKind::Leave, "close"),
            (MessageKind::RoomChange, "game"),
        ] {
            let m = msg(kind, "u1", "Alice", body, "");
            assert!(render(&m, "u2").is_empty(), "{} should render nothing", kind);
        }
    }
}
