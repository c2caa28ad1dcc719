//! Infrastructure 層
//!
//! Repository の実装、接続・セッションの管理、イベント配信、DTO を提供します。

pub mod broadcaster;
pub mod dto;
pub mod repository;
pub mod session_registry;

pub use broadcaster::Broadcaster;
pub use session_registry::{ConnectionSender, SessionRegistry};
