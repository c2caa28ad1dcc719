//! WebSocket message DTOs for the polling application.
//!
//! Every frame is a JSON object `{"event": "<name>", "data": {...}}` with
//! camelCase field names.

use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, Participant, Poll, PollId, PollResults, TallyEntry, Vote};

/// Events sent by clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    Join(JoinPayload),
    CreatePoll(CreatePollPayload),
    SubmitVote(SubmitVotePayload),
    EndPoll(EndPollPayload),
    SendMessage(SendMessagePayload),
    KickStudent(KickStudentPayload),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Join(_) => "join",
            ClientEvent::CreatePoll(_) => "createPoll",
            ClientEvent::SubmitVote(_) => "submitVote",
            ClientEvent::EndPoll(_) => "endPoll",
            ClientEvent::SendMessage(_) => "sendMessage",
            ClientEvent::KickStudent(_) => "kickStudent",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub session_id: String,
    pub role: String,
    #[serde(default)]
    pub student_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollPayload {
    pub session_id: String,
    pub question: String,
    pub options: Vec<String>,
    /// Duration in seconds
    pub duration: u32,
    #[serde(default)]
    pub correct_answers: Vec<String>,
    /// Informational; the poll is attributed to the caller's registered name
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitVotePayload {
    pub poll_id: String,
    pub session_id: String,
    /// Must match the caller's registered name when present
    #[serde(default)]
    pub student_name: Option<String>,
    pub option: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndPollPayload {
    pub poll_id: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    /// Poll id, or "lobby"
    pub poll_id: String,
    pub session_id: String,
    #[serde(default)]
    pub from: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickStudentPayload {
    pub session_id: String,
    #[serde(alias = "targetSocketId")]
    pub target_connection_id: String,
}

/// Events sent by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    Joined(JoinedPayload),
    ParticipantsUpdate(ParticipantsUpdatePayload),
    PollStarted(PollStartedPayload),
    TimerUpdate(TimerUpdatePayload),
    VoteUpdate(VoteUpdatePayload),
    PollEnded(PollEndedPayload),
    NewMessage(NewMessagePayload),
    Kicked(KickedPayload),
    Error(ErrorPayload),
}

impl ServerEvent {
    /// Event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Joined(_) => "joined",
            ServerEvent::ParticipantsUpdate(_) => "participantsUpdate",
            ServerEvent::PollStarted(_) => "pollStarted",
            ServerEvent::TimerUpdate(_) => "timerUpdate",
            ServerEvent::VoteUpdate(_) => "voteUpdate",
            ServerEvent::PollEnded(_) => "pollEnded",
            ServerEvent::NewMessage(_) => "newMessage",
            ServerEvent::Kicked(_) => "kicked",
            ServerEvent::Error(_) => "error",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn error(message: impl Into<String>, category: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorPayload {
            message: message.into(),
            category: category.into(),
        })
    }

    pub fn joined(participant: &Participant) -> Self {
        ServerEvent::Joined(JoinedPayload {
            connection_id: participant.connection_id.as_str().to_string(),
            session_id: participant.session_id.as_str().to_string(),
            name: participant.name.as_str().to_string(),
            role: participant.role.as_str().to_string(),
        })
    }

    pub fn participants_update(participants: &[Participant]) -> Self {
        ServerEvent::ParticipantsUpdate(ParticipantsUpdatePayload {
            participants: participants.iter().map(ParticipantInfo::from).collect(),
        })
    }

    pub fn poll_started(poll: &Poll, remaining_time: u32) -> Self {
        ServerEvent::PollStarted(PollStartedPayload {
            poll: PollDto::from(poll),
            remaining_time,
        })
    }

    pub fn timer_update(poll_id: &PollId, remaining_time: u32) -> Self {
        ServerEvent::TimerUpdate(TimerUpdatePayload {
            poll_id: poll_id.as_str().to_string(),
            remaining_time,
        })
    }

    pub fn vote_update(poll: &Poll, tally: &[TallyEntry]) -> Self {
        ServerEvent::VoteUpdate(VoteUpdatePayload {
            poll_id: poll.id.as_str().to_string(),
            results: tally.iter().map(TallyEntryDto::from).collect(),
            total_votes: poll.total_votes(),
        })
    }

    pub fn poll_ended(poll: &Poll) -> Self {
        ServerEvent::PollEnded(PollEndedPayload {
            poll_id: poll.id.as_str().to_string(),
            results: PollResultsDto::from(&poll.results()),
        })
    }

    pub fn new_message(message: &ChatMessage) -> Self {
        ServerEvent::NewMessage(NewMessagePayload {
            poll_id: message.scope.as_str().to_string(),
            from: message.from.as_str().to_string(),
            text: message.text.as_str().to_string(),
            timestamp: message.timestamp.value(),
        })
    }

    pub fn kicked(message: impl Into<String>) -> Self {
        ServerEvent::Kicked(KickedPayload {
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedPayload {
    pub connection_id: String,
    pub session_id: String,
    pub name: String,
    pub role: String,
}

/// Participant information for presence updates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub connection_id: String,
    pub name: String,
    pub role: String,
}

impl From<&Participant> for ParticipantInfo {
    fn from(p: &Participant) -> Self {
        Self {
            connection_id: p.connection_id.as_str().to_string(),
            name: p.name.as_str().to_string(),
            role: p.role.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantsUpdatePayload {
    pub participants: Vec<ParticipantInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStartedPayload {
    pub poll: PollDto,
    pub remaining_time: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerUpdatePayload {
    pub poll_id: String,
    pub remaining_time: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteUpdatePayload {
    pub poll_id: String,
    pub results: Vec<TallyEntryDto>,
    pub total_votes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollEndedPayload {
    pub poll_id: String,
    pub results: PollResultsDto,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessagePayload {
    pub poll_id: String,
    pub from: String,
    pub text: String,
    /// Unix timestamp (milliseconds since epoch) in JST
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickedPayload {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub message: String,
    /// validation / conflict / notFound / notAuthorized / persistence
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteDto {
    pub student_name: String,
    pub option: String,
}

impl From<&Vote> for VoteDto {
    fn from(v: &Vote) -> Self {
        Self {
            student_name: v.student_name.as_str().to_string(),
            option: v.option.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollDto {
    pub id: String,
    pub session_id: String,
    pub question: String,
    pub options: Vec<String>,
    /// Duration in seconds
    pub duration: u32,
    /// Unix timestamp (milliseconds since epoch) in JST
    pub start_time: i64,
    pub active: bool,
    pub correct_answers: Vec<String>,
    pub votes: Vec<VoteDto>,
    pub created_by: String,
}

impl From<&Poll> for PollDto {
    fn from(p: &Poll) -> Self {
        Self {
            id: p.id.as_str().to_string(),
            session_id: p.session_id.as_str().to_string(),
            question: p.question.clone(),
            options: p.options.clone(),
            duration: p.duration_seconds,
            start_time: p.start_time.value(),
            active: p.active,
            correct_answers: p.correct_answers.clone(),
            votes: p.votes.iter().map(VoteDto::from).collect(),
            created_by: p.created_by.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyEntryDto {
    pub option: String,
    pub votes: usize,
    pub percentage: f64,
}

impl From<&TallyEntry> for TallyEntryDto {
    fn from(t: &TallyEntry) -> Self {
        Self {
            option: t.option.clone(),
            votes: t.votes,
            percentage: t.percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResultsDto {
    pub poll_id: String,
    pub question: String,
    pub options: Vec<TallyEntryDto>,
    pub total_votes: usize,
    pub correct_answers: Vec<String>,
}

impl From<&PollResults> for PollResultsDto {
    fn from(r: &PollResults) -> Self {
        Self {
            poll_id: r.poll_id.as_str().to_string(),
            question: r.question.clone(),
            options: r.options.iter().map(TallyEntryDto::from).collect(),
            total_votes: r.total_votes,
            correct_answers: r.correct_answers.clone(),
        }
    }
}
