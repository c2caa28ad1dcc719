//! Core domain models for the polling application.

use serde::{Deserialize, Serialize};

use super::{
    error::PollError,
    value_object::{
        ChatScope, ConnectionId, MessageText, ParticipantName, PollId, Role, SessionId, Timestamp,
    },
};

/// Minimum number of options a poll must offer
pub const MIN_POLL_OPTIONS: usize = 2;

/// Shortest allowed poll duration in seconds
pub const MIN_POLL_DURATION_SECONDS: u32 = 10;

/// Longest allowed poll duration in seconds (one hour)
pub const MAX_POLL_DURATION_SECONDS: u32 = 3600;

/// Maximum length of a poll question
pub const MAX_QUESTION_LENGTH: usize = 500;

/// Represents a connection's identity within a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Live connection this participant is bound to
    pub connection_id: ConnectionId,
    /// Normalized (trimmed, lower-case) name
    pub name: ParticipantName,
    pub role: Role,
    pub session_id: SessionId,
    /// Timestamp when the participant joined the session
    pub joined_at: Timestamp,
}

impl Participant {
    /// Create a new participant
    pub fn new(
        connection_id: ConnectionId,
        name: ParticipantName,
        role: Role,
        session_id: SessionId,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            connection_id,
            name,
            role,
            session_id,
            joined_at,
        }
    }

    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }
}

/// Validated input for creating a poll.
///
/// Holding a `PollDraft` means every creation rule has already been checked;
/// only the single-active-poll rule remains, and it is enforced by the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollDraft {
    pub session_id: SessionId,
    pub question: String,
    pub options: Vec<String>,
    pub duration_seconds: u32,
    pub correct_answers: Vec<String>,
    pub created_by: ParticipantName,
}

impl PollDraft {
    /// Validate and build a poll draft.
    ///
    /// # Errors
    ///
    /// Returns a `PollError` describing the first rule the input breaks:
    /// empty/too long question, fewer than two options, an empty or duplicated
    /// option, a duration outside 10..=3600 seconds, or a correct answer that is
    /// not one of the options.
    pub fn new(
        session_id: SessionId,
        question: &str,
        options: Vec<String>,
        duration_seconds: u32,
        correct_answers: Vec<String>,
        created_by: ParticipantName,
    ) -> Result<Self, PollError> {
        let question = question.trim().to_string();
        if question.is_empty() {
            return Err(PollError::QuestionEmpty);
        }
        let question_len = question.chars().count();
        if question_len > MAX_QUESTION_LENGTH {
            return Err(PollError::QuestionTooLong {
                max: MAX_QUESTION_LENGTH,
                actual: question_len,
            });
        }

        if options.len() < MIN_POLL_OPTIONS {
            return Err(PollError::TooFewOptions {
                min: MIN_POLL_OPTIONS,
                actual: options.len(),
            });
        }
        let mut normalized_options: Vec<String> = Vec::with_capacity(options.len());
        for (index, option) in options.iter().enumerate() {
            let option = option.trim();
            if option.is_empty() {
                return Err(PollError::OptionEmpty { index });
            }
            if normalized_options.iter().any(|o| o == option) {
                return Err(PollError::DuplicateOption(option.to_string()));
            }
            normalized_options.push(option.to_string());
        }

        if !(MIN_POLL_DURATION_SECONDS..=MAX_POLL_DURATION_SECONDS).contains(&duration_seconds) {
            return Err(PollError::DurationOutOfRange {
                min: MIN_POLL_DURATION_SECONDS,
                max: MAX_POLL_DURATION_SECONDS,
                actual: duration_seconds,
            });
        }

        let mut normalized_answers: Vec<String> = Vec::new();
        for answer in &correct_answers {
            let answer = answer.trim();
            if !normalized_options.iter().any(|o| o == answer) {
                return Err(PollError::CorrectAnswerNotAnOption(answer.to_string()));
            }
            if !normalized_answers.iter().any(|a| a == answer) {
                normalized_answers.push(answer.to_string());
            }
        }

        Ok(Self {
            session_id,
            question,
            options: normalized_options,
            duration_seconds,
            correct_answers: normalized_answers,
            created_by,
        })
    }
}

/// Why a poll left the active state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndCause {
    Timeout,
    Manual,
}

/// A single student's vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub student_name: ParticipantName,
    pub option: String,
}

/// One row of a tally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub option: String,
    pub votes: usize,
    /// Share of all votes, rounded to 2 decimal places
    pub percentage: f64,
}

/// Final or live results of a poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResults {
    pub poll_id: PollId,
    pub question: String,
    pub options: Vec<TallyEntry>,
    pub total_votes: usize,
    pub correct_answers: Vec<String>,
}

/// Represents one question-with-options-and-duration unit of voting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: PollId,
    pub session_id: SessionId,
    pub question: String,
    pub options: Vec<String>,
    pub duration_seconds: u32,
    pub start_time: Timestamp,
    pub active: bool,
    pub correct_answers: Vec<String>,
    pub votes: Vec<Vote>,
    pub created_by: ParticipantName,
}

impl Poll {
    /// Start a new active poll from a validated draft
    pub fn start(id: PollId, draft: PollDraft, start_time: Timestamp) -> Self {
        Self {
            id,
            session_id: draft.session_id,
            question: draft.question,
            options: draft.options,
            duration_seconds: draft.duration_seconds,
            start_time,
            active: true,
            correct_answers: draft.correct_answers,
            votes: Vec::new(),
            created_by: draft.created_by,
        }
    }

    /// Check whether `student_name` may vote for `option`.
    ///
    /// Checks run in a fixed priority order: ended poll, duplicate vote, unknown option.
    /// Nothing is mutated; the returned vote is applied with [`Poll::record_vote`].
    pub fn check_vote(
        &self,
        student_name: &ParticipantName,
        option: &str,
    ) -> Result<Vote, PollError> {
        if !self.active {
            return Err(PollError::PollEnded);
        }
        if self.has_voted(student_name) {
            return Err(PollError::DuplicateVote(student_name.as_str().to_string()));
        }
        if !self.options.iter().any(|o| o == option) {
            return Err(PollError::InvalidOption(option.to_string()));
        }
        Ok(Vote {
            student_name: student_name.clone(),
            option: option.to_string(),
        })
    }

    /// Append a vote previously returned by [`Poll::check_vote`].
    ///
    /// Must be called under the same exclusive access as the check.
    pub fn record_vote(&mut self, vote: Vote) {
        self.votes.push(vote);
    }

    pub fn has_voted(&self, student_name: &ParticipantName) -> bool {
        self.votes.iter().any(|v| &v.student_name == student_name)
    }

    /// Flip the poll to ended. Succeeds exactly once.
    pub fn end(&mut self) -> Result<(), PollError> {
        if !self.active {
            return Err(PollError::AlreadyEnded);
        }
        self.active = false;
        Ok(())
    }

    pub fn total_votes(&self) -> usize {
        self.votes.len()
    }

    /// Per-option counts and percentages, in option declaration order.
    pub fn compute_tally(&self) -> Vec<TallyEntry> {
        let total = self.votes.len();
        self.options
            .iter()
            .map(|option| {
                let votes = self.votes.iter().filter(|v| &v.option == option).count();
                let percentage = if total == 0 {
                    0.0
                } else {
                    round_to_two_decimals(votes as f64 / total as f64 * 100.0)
                };
                TallyEntry {
                    option: option.clone(),
                    votes,
                    percentage,
                }
            })
            .collect()
    }

    pub fn results(&self) -> PollResults {
        PollResults {
            poll_id: self.id.clone(),
            question: self.question.clone(),
            options: self.compute_tally(),
            total_votes: self.total_votes(),
            correct_answers: self.correct_answers.clone(),
        }
    }

    /// Seconds left at `now`, derived from the start time. Never negative.
    pub fn remaining_seconds(&self, now: Timestamp) -> u32 {
        let elapsed_millis = (now.value() - self.start_time.value()).max(0);
        let elapsed_seconds = u32::try_from(elapsed_millis / 1000).unwrap_or(u32::MAX);
        self.duration_seconds.saturating_sub(elapsed_seconds)
    }
}

fn round_to_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Represents a chat message in the domain model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub session_id: SessionId,
    /// Poll (or lobby) the message was sent in
    pub scope: ChatScope,
    /// Sender's normalized name
    pub from: ParticipantName,
    pub text: MessageText,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(
        session_id: SessionId,
        scope: ChatScope,
        from: ParticipantName,
        text: MessageText,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            session_id,
            scope,
            from,
            text,
            timestamp,
        }
    }
}
