//! Kyoshitsu live classroom polling server library.
//!
//! Teachers start timed multiple-choice polls in a session, students vote,
//! and every participant of the session receives live tallies, countdown
//! ticks and chat over WebSocket.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::ServerConfig;
pub use ui::{ServerError, run as run_server, serve};
