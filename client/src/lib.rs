//! # Chat Client Library
//!
//! A thin line-oriented shell for the chat relay. It reads lines from the
//! user, turns them into wire messages according to the active delivery
//! mode, and prints whatever the relay sends back.
//!
//! ## Module Organization
//!
//! ### Input Module (`input`)
//! Client-side session state and command parsing:
//! - Delivery mode (`/g` everyone, `/r` current room, `/w:<id>` one client)
//! - Room membership (`/j:<room>`, `/l`)
//! - Join and leave records for the session lifecycle
//!
//! ### Render Module (`render`)
//! Formats received messages and rosters as text lines.
//!
//! ### Network Module (`network`)
//! UDP socket handling: sends the join on startup, relays input lines and
//! incoming datagrams, and sends the leave on quit.
//!
//! ## Usage Example
//!
//! ```rust
//! use client::input::{Action, ChatInput};
//! use shared::MessageKind;
//!
//! let mut input = ChatInput::new("a1b2c3", "Alice");
//! input.submit("/j:game");
//! input.submit("/r");
//!
//! match &input.submit("go")[0] {
//!     Action::Send(msg) => {
//!         assert_eq!(msg.kind, MessageKind::Multicast);
//!         assert_eq!(msg.target, "game");
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

pub mod input;
pub mod network;
pub mod render;
