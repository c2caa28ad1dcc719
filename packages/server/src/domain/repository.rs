//! Repository traits for the external poll/chat store.
//!
//! The domain defines what it needs from persistence; implementations live in
//! the infrastructure layer (dependency inversion).

use async_trait::async_trait;

use super::{
    ChatMessage, ChatScope, Poll, PollId, SessionId, Timestamp, Vote, error::RepositoryError,
};

/// Durable CRUD for polls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PollRepository: Send + Sync {
    /// Persist a newly created poll
    async fn insert(&self, poll: &Poll) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, poll_id: &PollId) -> Result<Option<Poll>, RepositoryError>;

    /// Polls of a session, newest first.
    ///
    /// `active` filters by the active flag when given.
    async fn find_by_session(
        &self,
        session_id: &SessionId,
        active: Option<bool>,
    ) -> Result<Vec<Poll>, RepositoryError>;

    /// Append one vote to a stored poll
    async fn append_vote(&self, poll_id: &PollId, vote: &Vote) -> Result<(), RepositoryError>;

    /// Persist the active→ended transition
    async fn mark_ended(&self, poll_id: &PollId) -> Result<(), RepositoryError>;

    async fn delete(&self, poll_id: &PollId) -> Result<bool, RepositoryError>;
}

/// Append-only store for chat messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn insert(&self, message: &ChatMessage) -> Result<(), RepositoryError>;

    /// Messages of one poll/lobby scope in a session, oldest first
    async fn find_by_scope(
        &self,
        session_id: &SessionId,
        scope: &ChatScope,
    ) -> Result<Vec<ChatMessage>, RepositoryError>;

    /// Most recent messages of a session, newest first
    async fn find_recent_by_session(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, RepositoryError>;

    /// Delete every message older than `cutoff`; returns how many were removed
    async fn delete_older_than(&self, cutoff: Timestamp) -> Result<usize, RepositoryError>;
}
