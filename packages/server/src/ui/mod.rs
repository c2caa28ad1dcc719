//! UI 層
//!
//! WebSocket と HTTP のエンドポイント。受け取った入力をドメインモデルに変換し、
//! UseCase 層を呼び出します。

mod error;
mod handler;
mod maintenance;
mod router;
mod runner;
mod signal;
pub mod state;

pub use error::ServerError;
pub use router::build_router;
pub use runner::{run, serve};
