//! Routing engine: decides who receives each inbound message
//!
//! The engine keeps no state between calls. For every decoded message it
//! applies the directory side effect for its kind and computes the recipient
//! set, returning a [`Delivery`] for the outbound dispatcher.
//!
//! | kind       | directory effect | recipients                     |
//! |------------|------------------|--------------------------------|
//! | Join       | upsert           | roster to everyone alive       |
//! | Leave      | mark left        | roster to everyone alive       |
//! | RoomChange | set room         | roster to everyone alive       |
//! | Broadcast  | none             | everyone alive, sender too     |
//! | Multicast  | none             | alive members of `target` room |
//! | Unicast    | none             | the `target` session, if alive |
//! | ListUpdate | rejected         | server-originated only         |

use crate::directory::{Session, SessionDirectory};
use log::{debug, warn};
use shared::{check_field_len, encode_roster_capped, ChatError, Message, MessageKind};
use std::net::SocketAddr;

/// How broadcast-class messages (Broadcast and ListUpdate) leave the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadcastStrategy {
    /// One datagram per alive session in the directory
    #[default]
    Directory,
    /// A single datagram to a broadcast/rendezvous address
    Rendezvous(SocketAddr),
}

/// Where a single copy of a message goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Session { id: String, addr: SocketAddr },
    Rendezvous(SocketAddr),
}

impl Destination {
    pub fn addr(&self) -> SocketAddr {
        match self {
            Destination::Session { addr, .. } => *addr,
            Destination::Rendezvous(addr) => *addr,
        }
    }
}

impl From<&Session> for Destination {
    fn from(session: &Session) -> Self {
        Destination::Session {
            id: session.id.clone(),
            addr: session.addr,
        }
    }
}

/// A message paired with its resolved recipients
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message: Message,
    pub destinations: Vec<Destination>,
}

impl Delivery {
    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    /// Ids of the sessions this delivery targets directly
    pub fn session_ids(&self) -> Vec<&str> {
        self.destinations
            .iter()
            .filter_map(|d| match d {
                Destination::Session { id, .. } => Some(id.as_str()),
                Destination::Rendezvous(_) => None,
            })
            .collect()
    }
}

pub struct Router {
    broadcast: BroadcastStrategy,
}

impl Router {
    pub fn new(broadcast: BroadcastStrategy) -> Self {
        Self { broadcast }
    }

    /// Applies `message` to the directory and computes its recipients
    ///
    /// An empty delivery is a valid outcome (directed message to a departed
    /// client). Errors are protocol violations; the caller logs and drops.
    pub fn route(
        &self,
        directory: &mut SessionDirectory,
        message: Message,
        from: SocketAddr,
    ) -> Result<Delivery, ChatError> {
        match message.kind {
            MessageKind::Join => {
                if message.sender_id.is_empty() {
                    return Err(ChatError::ProtocolViolation(format!(
                        "join from {} without a sender id",
                        from
                    )));
                }
                bounded(&message, "sender id", &message.sender_id)?;
                bounded(&message, "sender name", &message.sender_name)?;
                directory.upsert_on_join(&message.sender_id, &message.sender_name, from);
                Ok(self.roster_update(directory))
            }

            MessageKind::Leave => {
                if directory.get(&message.sender_id).is_none() {
                    return Err(unknown_sender(&message));
                }
                directory.mark_left(&message.sender_id);
                Ok(self.roster_update(directory))
            }

            MessageKind::RoomChange => {
                admit(directory, &message)?;
                bounded(&message, "room name", &message.body)?;
                directory.set_room(&message.sender_id, &message.body);
                Ok(self.roster_update(directory))
            }

            MessageKind::Broadcast => {
                admit(directory, &message)?;
                let destinations = self.everyone(directory);
                Ok(Delivery {
                    message,
                    destinations,
                })
            }

            MessageKind::Multicast => {
                admit(directory, &message)?;
                if message.target.is_empty() {
                    return Err(ChatError::ProtocolViolation(format!(
                        "multicast from `{}` names no room",
                        message.sender_id
                    )));
                }
                let destinations = directory
                    .members_of_room(&message.target)
                    .iter()
                    .map(Destination::from)
                    .collect();
                Ok(Delivery {
                    message,
                    destinations,
                })
            }

            MessageKind::Unicast => {
                admit(directory, &message)?;
                let destinations = match directory.address_of(&message.target) {
                    Ok(addr) => vec![Destination::Session {
                        id: message.target.clone(),
                        addr,
                    }],
                    Err(e) => {
                        debug!("Dropping unicast from {}: {}", message.sender_id, e);
                        Vec::new()
                    }
                };
                Ok(Delivery {
                    message,
                    destinations,
                })
            }

            MessageKind::ListUpdate => Err(ChatError::ProtocolViolation(format!(
                "client `{}` sent a server-only roster update",
                message.sender_id
            ))),
        }
    }

    /// A fresh roster addressed to every alive session
    ///
    /// Sessions that do not fit in one datagram are left off the end.
    pub fn roster_update(&self, directory: &SessionDirectory) -> Delivery {
        let entries = directory.roster();
        let (body, listed) = encode_roster_capped(&entries);
        if listed < entries.len() {
            warn!(
                "Roster truncated to {} of {} sessions to fit one datagram",
                listed,
                entries.len()
            );
        }
        Delivery {
            message: Message::from_server(MessageKind::ListUpdate, body),
            destinations: self.everyone(directory),
        }
    }

    fn everyone(&self, directory: &SessionDirectory) -> Vec<Destination> {
        match self.broadcast {
            BroadcastStrategy::Directory => directory
                .snapshot_alive()
                .iter()
                .map(Destination::from)
                .collect(),
            BroadcastStrategy::Rendezvous(addr) => vec![Destination::Rendezvous(addr)],
        }
    }
}

/// Accepts traffic only from alive senders and refreshes their activity
fn admit(directory: &mut SessionDirectory, message: &Message) -> Result<(), ChatError> {
    match directory.get(&message.sender_id).map(|session| session.alive) {
        None => Err(unknown_sender(message)),
        Some(false) => Err(ChatError::ProtocolViolation(format!(
            "{} from departed sender `{}`",
            message.kind, message.sender_id
        ))),
        Some(true) => {
            directory.touch(&message.sender_id);
            Ok(())
        }
    }
}

fn bounded(message: &Message, field: &'static str, value: &str) -> Result<(), ChatError> {
    check_field_len(field, value)
        .map_err(|e| ChatError::ProtocolViolation(format!("{}: {}", message.kind, e)))
}

fn unknown_sender(message: &Message) -> ChatError {
    ChatError::ProtocolViolation(format!(
        "{} from unknown sender `{}`",
        message.kind, message.sender_id
    ))
}
