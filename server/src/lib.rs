//! # Chat Relay Server Library
//!
//! This library provides the server side of a datagram group-chat relay. It
//! accepts UDP packets from many clients, tracks who is connected and which
//! room they are in, and redistributes each message according to its
//! delivery mode.
//!
//! ## Core Responsibilities
//!
//! ### Session Tracking
//! Every client is known by the identifier it chose on `Join`. The server
//! records its name, learned address, room and liveness, and keeps departed
//! sessions around so late directed messages fail quietly.
//!
//! ### Routing
//! Each inbound message is classified by kind:
//! - `Join`, `Leave` and `RoomChange` update the directory and trigger a
//!   freshly computed roster (`ListUpdate`) to everyone alive
//! - `Broadcast` goes to every alive session, the sender included
//! - `Multicast` goes to the alive members of the target room
//! - `Unicast` goes to the target session only, or nowhere if it is gone
//!
//! ### Delivery
//! Outbound datagrams are written by a separate task behind a bounded queue,
//! so a slow network write never stalls intake.
//!
//! ## Architecture Design
//!
//! ### Single Writer
//! One intake loop receives, decodes and routes datagrams strictly in
//! arrival order, and is the only code that mutates the session directory.
//! The directory therefore needs no locking.
//!
//! ### Best Effort
//! There are no acknowledgements or retries. A malformed datagram, a message
//! from an unknown sender or a failed write is logged and dropped; only a
//! bind failure at startup stops the server.
//!
//! ## Module Organization
//!
//! - `config`: [`config::ServerConfig`], populated from the command line
//! - `directory`: the session directory
//! - `routing`: the routing engine and broadcast strategies
//! - `dispatcher`: the outbound writer task and its queue
//! - `network`: the UDP intake loop tying the pieces together
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default().with_bind_addr("0.0.0.0:8080");
//!     let server = Server::new(config).await?;
//!
//!     // Runs until Ctrl+C, then drains queued deliveries
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod directory;
pub mod dispatcher;
pub mod network;
pub mod routing;
