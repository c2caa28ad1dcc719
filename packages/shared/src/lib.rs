//! Shared utilities for Kyoshitsu.
//!
//! Logger setup and timestamp helpers used by every package in the workspace.

pub mod logger;
pub mod time;
