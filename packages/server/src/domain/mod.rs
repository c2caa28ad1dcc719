//! Domain layer for the polling application.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use entity::{
    ChatMessage, EndCause, Participant, Poll, PollDraft, PollResults, TallyEntry, Vote,
};
pub use error::{PollError, RepositoryError, SessionError, ValueObjectError};
pub use factory::{ConnectionIdFactory, PollIdFactory};
pub use repository::{ChatRepository, PollRepository};
pub use value_object::{
    ChatScope, ConnectionId, MessageText, ParticipantName, PollId, Role, SessionId, Timestamp,
};
