//! # Card Room Server Library
//!
//! This library implements the session server for the two-player card game.
//! Clients connect over TCP, log in, join rooms of two, chat through per-member
//! mailboxes and play rounds of rock/paper/scissors cards.
//!
//! ## Architecture Design
//!
//! ### Task Layout
//! The server is a small set of cooperating tokio tasks connected by bounded
//! channels:
//! - **Accept loop**: registers every new socket and spawns its read loop
//! - **Read loops**: one per connection, decode one JSON request at a time and
//!   push it onto the ingress queue
//! - **Dispatcher**: drains the ingress queue and spawns one task per request
//! - **Writer**: drains the egress queue and writes each response to the
//!   connection it is addressed to
//!
//! A bounded queue blocks its producer when full, which is the only throttle
//! on how fast clients can feed the server.
//!
//! ### Shared State
//! All state lives in a [`context::ServerContext`] built once at startup and
//! shared by reference. Every room sits behind its own mutex, so a check and
//! the mutation that depends on it (room not full → add member, member has not
//! played → record play) always happen in one critical section. The
//! connection registry and the session map are locked independently of each
//! other and of the rooms.
//!
//! ### Round Delivery
//! When the second card of a round is played the round is completed and
//! reset in the same critical section, and both players receive an
//! `opponent_played` push with the other card. No client ever has to poll
//! for the result.
//!
//! ## Module Organization
//!
//! - `config`: command line / default configuration
//! - `connection`: connection identity, write side and queue envelopes
//! - `registry`: connection registry used by the writer
//! - `sessions`: user ⇄ connection bindings used for pushes
//! - `router`: method → handler table and dispatch loop
//! - `handlers`: one function per protocol method
//! - `room`, `mailbox`, `lobby`: the room/round state machine, chat
//!   mailboxes and the room directory
//! - `accounts`, `shop`: credential store and card packages
//! - `network`: the TCP server tying it all together
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let server = Server::bind(&config).await?;
//!
//!     // Runs until Ctrl+C
//!     server
//!         .run_until(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await;
//!
//!     Ok(())
//! }
//! ```

pub mod accounts;
pub mod config;
pub mod connection;
pub mod context;
pub mod error;
pub mod handlers;
pub mod lobby;
pub mod mailbox;
pub mod network;
pub mod registry;
pub mod room;
pub mod router;
pub mod sessions;
pub mod shop;

/// Logical user identity. Usernames double as user ids.
pub type UserId = String;

/// Room identity handed out by the room directory.
pub type RoomId = String;
