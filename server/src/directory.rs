//! Session directory for the chat relay
//!
//! This module owns every server-side session record:
//! - Session lifecycle (join, re-join, leave, idle expiry)
//! - Room membership, stored as a single attribute per session
//! - Address resolution for directed delivery
//! - Roster snapshots for `ListUpdate` broadcasts
//!
//! Departed sessions are kept with `alive = false` rather than removed, so a
//! late message aimed at them resolves to "unknown recipient" instead of
//! touching a missing record. The directory has a single writer (the inbound
//! worker) and needs no internal locking.

use log::info;
use shared::{ChatError, RosterEntry};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Server-side record of one client
#[derive(Debug, Clone)]
pub struct Session {
    /// Client-chosen identifier, stable for the session's lifetime
    pub id: String,
    /// Display name, not required to be unique
    pub name: String,
    /// Address learned from the client's most recent join
    pub addr: SocketAddr,
    /// Current room, empty when in none
    pub room: String,
    pub alive: bool,
    /// Last time we accepted any message from this client
    pub last_seen: Instant,
    /// Join order, used to keep snapshots stable
    order: u64,
}

impl Session {
    fn new(id: &str, name: &str, addr: SocketAddr, order: u64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            addr,
            room: String::new(),
            alive: true,
            last_seen: Instant::now(),
            order,
        }
    }

    /// Checks if no message has been accepted within `timeout`
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }

    pub fn roster_entry(&self) -> RosterEntry {
        RosterEntry::new(self.name.as_str(), self.id.as_str(), self.room.as_str())
    }
}

/// Mapping from client identifier to session record
///
/// The only component allowed to mutate sessions. The routing engine asks for
/// changes through the methods below and never touches the map directly.
pub struct SessionDirectory {
    sessions: HashMap<String, Session>,
    /// Next join-order slot handed to a previously unseen id
    next_order: u64,
}

impl SessionDirectory {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            next_order: 0,
        }
    }

    /// Creates a session for an unseen id, or refreshes an existing one
    ///
    /// A re-join updates the name and address in place and keeps the
    /// session's place in the roster. If the session had departed it is
    /// revived with no room, like a fresh join.
    pub fn upsert_on_join(&mut self, id: &str, name: &str, addr: SocketAddr) -> &Session {
        let next_order = &mut self.next_order;
        let session = self
            .sessions
            .entry(id.to_string())
            .and_modify(|session| {
                if !session.alive {
                    session.room.clear();
                    session.alive = true;
                }
                session.name = name.to_string();
                session.addr = addr;
                session.last_seen = Instant::now();
                info!("Client {} ({}) re-joined from {}", id, name, addr);
            })
            .or_insert_with(|| {
                let order = *next_order;
                *next_order += 1;
                info!("Client {} ({}) joined from {}", id, name, addr);
                Session::new(id, name, addr, order)
            });
        session
    }

    /// Moves a session into `room` (empty leaves every room)
    ///
    /// Unknown ids are ignored. Returns true if a session was updated.
    pub fn set_room(&mut self, id: &str, room: &str) -> bool {
        match self.sessions.get_mut(id) {
            Some(session) => {
                session.room = room.to_string();
                true
            }
            None => false,
        }
    }

    /// Marks a session as departed; idempotent
    ///
    /// Returns true only when the session was alive before the call.
    pub fn mark_left(&mut self, id: &str) -> bool {
        match self.sessions.get_mut(id) {
            Some(session) if session.alive => {
                session.alive = false;
                info!("Client {} ({}) left", session.id, session.name);
                true
            }
            _ => false,
        }
    }

    /// Refreshes the activity timestamp of a known session
    pub fn touch(&mut self, id: &str) {
        if let Some(session) = self.sessions.get_mut(id) {
            session.last_seen = Instant::now();
        }
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn is_alive(&self, id: &str) -> bool {
        self.sessions.get(id).is_some_and(|s| s.alive)
    }

    /// All alive sessions in join order
    ///
    /// Always a full recomputation; the roster is never patched incrementally.
    pub fn snapshot_alive(&self) -> Vec<Session> {
        let mut alive: Vec<Session> = self
            .sessions
            .values()
            .filter(|session| session.alive)
            .cloned()
            .collect();
        alive.sort_by_key(|session| session.order);
        alive
    }

    /// Roster entries for every alive session, in join order
    pub fn roster(&self) -> Vec<RosterEntry> {
        self.snapshot_alive()
            .iter()
            .map(Session::roster_entry)
            .collect()
    }

    /// Resolves the address of an alive session
    pub fn address_of(&self, id: &str) -> Result<SocketAddr, ChatError> {
        match self.sessions.get(id) {
            Some(session) if session.alive => Ok(session.addr),
            _ => Err(ChatError::UnknownRecipient(id.to_string())),
        }
    }

    /// Alive sessions whose room equals `room`, in join order
    pub fn members_of_room(&self, room: &str) -> Vec<Session> {
        // Full scan; fine for the tens to low hundreds of sessions we expect
        self.snapshot_alive()
            .into_iter()
            .filter(|session| session.room == room)
            .collect()
    }

    /// Marks every alive session idle for longer than `timeout` as departed
    ///
    /// Returns the ids that were expired.
    pub fn expire_idle(&mut self, timeout: Duration) -> Vec<String> {
        let expired: Vec<String> = self
            .sessions
            .values()
            .filter(|session| session.alive && session.is_timed_out(timeout))
            .map(|session| session.id.clone())
            .collect();

        for id in &expired {
            self.mark_left(id);
        }

        expired
    }

    /// Number of alive sessions
    pub fn alive_count(&self) -> usize {
        self.sessions.values().filter(|s| s.alive).count()
    }

    /// Number of records, departed sessions included
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:9001".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:9002".parse().unwrap()
    }

    fn ids(sessions: &[Session]) -> Vec<&str> {
        sessions.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_directory_creation() {
        let directory = SessionDirectory::new();
        assert!(directory.is_empty());
        assert_eq!(directory.len(), 0);
        assert!(directory.snapshot_alive().is_empty());
    }

    #[test]
    fn test_join_distinct_ids() {
        let mut directory = SessionDirectory::new();
        for (i, id) in ["u1", "u2", "u3", "u4"].iter().enumerate() {
            let addr = SocketAddr::from(([127, 0, 0, 1], 9000 + i as u16));
            directory.upsert_on_join(id, "user", addr);
        }

        let alive = directory.snapshot_alive();
        assert_eq!(ids(&alive), vec!["u1", "u2", "u3", "u4"]);
        assert!(alive.iter().all(|s| s.alive));
    }

    #[test]
    fn test_rejoin_is_idempotent() {
        let mut directory = SessionDirectory::new();
        directory.upsert_on_join("u1", "Alice", test_addr());
        directory.upsert_on_join("u2", "Bob", test_addr());
        let session = directory.upsert_on_join("u1", "Alicia", test_addr2());

        assert_eq!(session.name, "Alicia");
        assert_eq!(session.addr, test_addr2());
        assert_eq!(directory.len(), 2);

        // Re-join keeps the original roster position
        assert_eq!(ids(&directory.snapshot_alive()), vec!["u1", "u2"]);
    }

    #[test]
    fn test_rejoin_keeps_room_while_alive() {
        let mut directory = SessionDirectory::new();
        directory.upsert_on_join("u1", "Alice", test_addr());
        directory.set_room("u1", "game");
        directory.upsert_on_join("u1", "Alice", test_addr2());

        assert_eq!(directory.get("u1").unwrap().room, "game");
    }

    #[test]
    fn test_rejoin_after_leave_revives_without_room() {
        let mut directory = SessionDirectory::new();
        directory.upsert_on_join("u1", "Alice", test_addr());
        directory.set_room("u1", "game");
        directory.mark_left("u1");

        let session = directory.upsert_on_join("u1", "Alice", test_addr());
        assert!(session.alive);
        assert!(session.room.is_empty());
    }

    #[test]
    fn test_set_room() {
        let mut directory = SessionDirectory::new();
        directory.upsert_on_join("u1", "Alice", test_addr());
        directory.upsert_on_join("u2", "Bob", test_addr2());

        assert!(directory.set_room("u1", "X"));

        assert_eq!(ids(&directory.members_of_room("X")), vec!["u1"]);
        assert!(directory.members_of_room("Y").is_empty());
        assert_eq!(ids(&directory.members_of_room("")), vec!["u2"]);
    }

    #[test]
    fn test_set_room_unknown_id_is_noop() {
        let mut directory = SessionDirectory::new();
        assert!(!directory.set_room("ghost", "X"));
        assert!(directory.is_empty());
    }

    #[test]
    fn test_mark_left() {
        let mut directory = SessionDirectory::new();
        directory.upsert_on_join("u1", "Alice", test_addr());
        directory.upsert_on_join("u2", "Bob", test_addr2());

        assert!(directory.mark_left("u2"));
        assert!(!directory.mark_left("u2"));
        assert!(!directory.mark_left("ghost"));

        assert_eq!(ids(&directory.snapshot_alive()), vec!["u1"]);
        // Record is retained
        assert_eq!(directory.len(), 2);
        assert!(!directory.is_alive("u2"));
        assert_eq!(directory.alive_count(), 1);
    }

    #[test]
    fn test_address_of() {
        let mut directory = SessionDirectory::new();
        directory.upsert_on_join("u1", "Alice", test_addr());
        directory.upsert_on_join("u2", "Bob", test_addr2());
        directory.mark_left("u2");

        assert_eq!(directory.address_of("u1").unwrap(), test_addr());

        match directory.address_of("u2") {
            Err(ChatError::UnknownRecipient(id)) => assert_eq!(id, "u2"),
            other => panic!("Expected UnknownRecipient, got {:?}", other),
        }
        assert!(directory.address_of("ghost").is_err());
    }

    #[test]
    fn test_members_of_room_excludes_departed() {
        let mut directory = SessionDirectory::new();
        directory.upsert_on_join("u1", "Alice", test_addr());
        directory.upsert_on_join("u2", "Bob", test_addr2());
        directory.set_room("u1", "game");
        directory.set_room("u2", "game");
        directory.mark_left("u1");

        assert_eq!(ids(&directory.members_of_room("game")), vec!["u2"]);
    }

    #[test]
    fn test_roster() {
        let mut directory = SessionDirectory::new();
        directory.upsert_on_join("u1", "Alice", test_addr());
        directory.upsert_on_join("u2", "Bob", test_addr2());
        directory.set_room("u2", "learn");

        assert_eq!(
            directory.roster(),
            vec![
                RosterEntry::new("Alice", "u1", ""),
                RosterEntry::new("Bob", "u2", "learn"),
            ]
        );
    }

    #[test]
    fn test_session_timeout() {
        let mut session = Session::new("u1", "Alice", test_addr(), 0);

        assert!(!session.is_timed_out(Duration::from_secs(1)));

        session.last_seen = Instant::now() - Duration::from_secs(2);

        assert!(session.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_expire_idle() {
        let mut directory = SessionDirectory::new();
        directory.upsert_on_join("u1", "Alice", test_addr());
        directory.upsert_on_join("u2", "Bob", test_addr2());

        if let Some(session) = directory.sessions.get_mut("u1") {
            session.last_seen = Instant::now() - Duration::from_secs(10);
        }

        let expired = directory.expire_idle(Duration::from_secs(5));
        assert_eq!(expired, vec!["u1".to_string()]);
        assert_eq!(ids(&directory.snapshot_alive()), vec!["u2"]);

        // Already departed sessions are not reported again
        assert!(directory.expire_idle(Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn test_touch_refreshes_activity() {
        let mut directory = SessionDirectory::new();
        directory.upsert_on_join("u1", "Alice", test_addr());

        if let Some(session) = directory.sessions.get_mut("u1") {
            session.last_seen = Instant::now() - Duration::from_secs(10);
        }
        directory.touch("u1");

        assert!(directory.expire_idle(Duration::from_secs(5)).is_empty());
    }
}
