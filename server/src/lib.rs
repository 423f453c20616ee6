//! # Useless Mine Server Library
//!
//! This library turns the "Useless" flag of a tank-combat game into a
//! placeable mine. Players who grab the flag can drop it where they stand;
//! the mine then waits for an enemy to drive close enough and blows up with
//! a shock wave credited to the player who set it. Carrying the defusal flag
//! turns the encounter around: the mine is disarmed and the shock wave goes
//! off under its owner instead.
//!
//! ## Core Responsibilities
//!
//! ### Mine Lifecycle
//! Every mine starts armed, leaves that state exactly once, either detonated
//! or defused, and is retired after its shock wave has had time to claim
//! its victims. Mines belonging to a player who leaves the game are removed
//! with them.
//!
//! ### Trigger Evaluation
//! Each position update from a spawned player is checked against every armed
//! mine. The trigger area is an axis-aligned cube around the mine sized from
//! the game's shock-wave radius. Team rules, the mine owner's immunity to
//! their own mines, and a grace period after spawning all apply before a
//! mine is allowed to fire.
//!
//! ### Kill Credit
//! The game only knows that a shock wave killed somebody. Every effect a
//! mine fires carries a token, and deaths caused by that token are rewritten
//! to credit the mine owner (or the defuser, when the owner was caught in
//! their own disarmed mine). A flavor message is picked at random from the
//! configured bank and broadcast.
//!
//! ### Player Commands
//! `/mine` places a mine, `/minecount` and `/minestats` report on the
//! field, and `/reload` re-reads the message files for operators with the
//! right permission.
//!
//! ## Architecture Design
//!
//! ### Host Boundary
//! All engine interaction goes through the [`host::Host`] trait: player
//! lookups, the clock, firing effects, taking flags away and sending chat.
//! The router itself owns no sockets and no timers, which keeps every rule
//! testable with an in-memory host.
//!
//! ### Single Owner of State
//! The [`router::EventRouter`] owns the mine field, the spawn clock and the
//! message banks. Events are handled one at a time, so no locking is needed
//! and each event observes the effects of the ones before it.
//!
//! ### UDP Bridge
//! The engine runs in its own process. The [`network::Server`] accepts a
//! single engine over UDP, mirrors its roster in a [`roster::RemoteHost`],
//! and sends back the commands the router produces for every event.
//!
//! ## Module Organization
//!
//! ### Configuration and Errors (`config`, `error`)
//! Tunables with their defaults, and the error types surfaced by mine
//! transitions, placement and message loading.
//!
//! ### Mines (`mine`, `minefield`)
//! A single mine's state machine and the collection that places, evaluates,
//! correlates and retires them.
//!
//! ### Routing (`router`, `spawn_clock`, `messages`)
//! Event dispatch, command handling, spawn grace periods and the flavor
//! text banks.
//!
//! ### Bridge (`network`, `roster`)
//! The UDP transport and the engine-side roster it keeps.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::MineConfig;
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     // Bind the bridge and retire resolved mines ten times a second
//!     let mut server = Server::new(
//!         "127.0.0.1:5155",
//!         Duration::from_millis(100),
//!         MineConfig::default(),
//!     ).await?;
//!
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod messages;
pub mod mine;
pub mod minefield;
pub mod network;
pub mod roster;
pub mod router;
pub mod spawn_clock;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;
