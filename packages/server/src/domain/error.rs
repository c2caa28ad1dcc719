//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    #[error("ConnectionId cannot be empty")]
    ConnectionIdEmpty,

    #[error("ConnectionId cannot exceed {max} characters (got {actual})")]
    ConnectionIdTooLong { max: usize, actual: usize },

    #[error("SessionId cannot be empty")]
    SessionIdEmpty,

    #[error("SessionId cannot exceed {max} characters (got {actual})")]
    SessionIdTooLong { max: usize, actual: usize },

    #[error("PollId cannot be empty")]
    PollIdEmpty,

    #[error("PollId cannot exceed {max} characters (got {actual})")]
    PollIdTooLong { max: usize, actual: usize },

    #[error("Name cannot be empty")]
    ParticipantNameEmpty,

    #[error("Name cannot exceed {max} characters (got {actual})")]
    ParticipantNameTooLong { max: usize, actual: usize },

    /// Role must be `teacher` or `student`
    #[error("Invalid role: {0}")]
    RoleInvalid(String),

    #[error("Message cannot be empty")]
    MessageTextEmpty,

    #[error("Message cannot exceed {max} characters (got {actual})")]
    MessageTextTooLong { max: usize, actual: usize },
}

/// Errors related to Poll domain logic
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("Question cannot be empty")]
    QuestionEmpty,

    #[error("Question cannot exceed {max} characters (got {actual})")]
    QuestionTooLong { max: usize, actual: usize },

    #[error("Poll must have at least {min} options (got {actual})")]
    TooFewOptions { min: usize, actual: usize },

    #[error("Option {index} cannot be empty")]
    OptionEmpty { index: usize },

    #[error("Duplicate option: {0}")]
    DuplicateOption(String),

    #[error("Duration must be between {min} and {max} seconds (got {actual})")]
    DurationOutOfRange { min: u32, max: u32, actual: u32 },

    #[error("Correct answer is not one of the options: {0}")]
    CorrectAnswerNotAnOption(String),

    /// Vote submitted after the poll ended
    #[error("Poll is no longer active")]
    PollEnded,

    #[error("Student {0} has already voted")]
    DuplicateVote(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Second attempt to end a poll (timer and manual end racing)
    #[error("Poll has already ended")]
    AlreadyEnded,
}

impl PollError {
    /// Whether the error describes malformed creation input.
    pub fn is_invalid_poll(&self) -> bool {
        matches!(
            self,
            PollError::QuestionEmpty
                | PollError::QuestionTooLong { .. }
                | PollError::TooFewOptions { .. }
                | PollError::OptionEmpty { .. }
                | PollError::DuplicateOption(_)
                | PollError::DurationOutOfRange { .. }
                | PollError::CorrectAnswerNotAnOption(_)
        )
    }
}

/// Errors related to session membership
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Student name is required")]
    StudentNameRequired,

    #[error(transparent)]
    InvalidName(#[from] ValueObjectError),

    #[error("Student name already taken: {0}")]
    DuplicateName(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Participant not found in session: {0}")]
    ParticipantNotFound(String),

    /// The transport connection is not registered (already closed)
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),
}

/// Errors raised by the external poll/chat store
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Poll not found in store: {0}")]
    PollNotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
