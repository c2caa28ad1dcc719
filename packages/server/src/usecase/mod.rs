//! UseCase 層
//!
//! ビジネスロジックを実装するレイヤー。
//! UI 層から呼び出され、Domain 層とセッション管理・配信を操作します。

mod access;
mod presence;
#[cfg(test)]
pub(crate) mod test_support;

pub mod connect_participant;
pub mod create_poll;
pub mod disconnect_participant;
pub mod end_poll;
pub mod error;
pub mod join_session;
pub mod kick_student;
pub mod poll_lifecycle;
pub mod poll_timer;
pub mod purge_chat_history;
pub mod query;
pub mod send_message;
pub mod submit_vote;

pub use connect_participant::ConnectParticipantUseCase;
pub use create_poll::{CreatePollUseCase, NewPoll};
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use end_poll::EndPollUseCase;
pub use error::{ErrorCategory, UseCaseError};
pub use join_session::JoinSessionUseCase;
pub use kick_student::KickStudentUseCase;
pub use poll_lifecycle::{PollGuard, PollLifecycle, VoteOutcome};
pub use poll_timer::PollTimer;
pub use purge_chat_history::PurgeChatHistoryUseCase;
pub use query::QueryUseCase;
pub use send_message::SendMessageUseCase;
pub use submit_vote::SubmitVoteUseCase;
