//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ValueObjectError;

/// Maximum length of every identifier (connection, session, poll).
pub const MAX_ID_LENGTH: usize = 100;

/// Maximum length of a participant name.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of a chat message.
pub const MAX_MESSAGE_LENGTH: usize = 500;

/// Chat scope sentinel used when no poll is active.
pub const LOBBY_SCOPE: &str = "lobby";

fn check_length(
    value: &str,
    max: usize,
    empty: ValueObjectError,
    too_long: impl FnOnce(usize, usize) -> ValueObjectError,
) -> Result<(), ValueObjectError> {
    if value.is_empty() {
        return Err(empty);
    }
    let len = value.chars().count();
    if len > max {
        return Err(too_long(max, len));
    }
    Ok(())
}

/// Connection identifier value object.
///
/// Identifies one live transport connection. Unique per connection, never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Create a new ConnectionId.
    ///
    /// # Arguments
    ///
    /// * `id` - The connection identifier string
    ///
    /// # Returns
    ///
    /// A Result containing the ConnectionId or an error if validation fails
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        check_length(
            &id,
            MAX_ID_LENGTH,
            ValueObjectError::ConnectionIdEmpty,
            |max, actual| ValueObjectError::ConnectionIdTooLong { max, actual },
        )?;
        Ok(Self(id))
    }

    /// Create a ConnectionId from a UUID.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid.to_string())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ConnectionId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session identifier value object.
///
/// A session is a named group of connections sharing one poll lifecycle and chat scope.
/// The identifier is chosen by clients and is opaque to the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new SessionId.
    ///
    /// Surrounding whitespace is trimmed before validation.
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        let id = id.trim().to_string();
        check_length(
            &id,
            MAX_ID_LENGTH,
            ValueObjectError::SessionIdEmpty,
            |max, actual| ValueObjectError::SessionIdTooLong { max, actual },
        )?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Poll identifier value object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PollId(String);

impl PollId {
    /// Create a new PollId.
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        check_length(
            &id,
            MAX_ID_LENGTH,
            ValueObjectError::PollIdEmpty,
            |max, actual| ValueObjectError::PollIdTooLong { max, actual },
        )?;
        Ok(Self(id))
    }

    /// Create a PollId from a UUID.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid.to_string())
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for PollId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for PollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Participant name value object.
///
/// Names are case-insensitive: the stored form is trimmed and lower-cased,
/// so `" Alice "` and `"alice"` are the same participant name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantName(String);

impl ParticipantName {
    /// Name given to a teacher who joins without one.
    pub const DEFAULT_TEACHER: &'static str = "teacher";

    /// Create a new ParticipantName, normalizing it first.
    ///
    /// # Arguments
    ///
    /// * `name` - The raw name as typed by the user
    ///
    /// # Returns
    ///
    /// A Result containing the normalized name or an error if it is empty or too long
    pub fn new(name: &str) -> Result<Self, ValueObjectError> {
        let normalized = name.trim().to_lowercase();
        check_length(
            &normalized,
            MAX_NAME_LENGTH,
            ValueObjectError::ParticipantNameEmpty,
            |max, actual| ValueObjectError::ParticipantNameTooLong { max, actual },
        )?;
        Ok(Self(normalized))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ParticipantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a participant within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(ValueObjectError::RoleInvalid(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chat message text value object.
///
/// Stored trimmed; must be non-empty and at most [`MAX_MESSAGE_LENGTH`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageText(String);

impl MessageText {
    pub fn new(text: &str) -> Result<Self, ValueObjectError> {
        let text = text.trim().to_string();
        check_length(
            &text,
            MAX_MESSAGE_LENGTH,
            ValueObjectError::MessageTextEmpty,
            |max, actual| ValueObjectError::MessageTextTooLong { max, actual },
        )?;
        Ok(Self(text))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MessageText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scope a chat message belongs to: a poll, or the lobby when no poll is active.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatScope {
    Lobby,
    Poll(PollId),
}

impl ChatScope {
    /// Parse the wire form: `"lobby"` or a poll id.
    pub fn parse(value: &str) -> Result<Self, ValueObjectError> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(LOBBY_SCOPE) {
            return Ok(ChatScope::Lobby);
        }
        PollId::new(value.to_string()).map(ChatScope::Poll)
    }

    /// Wire form of the scope.
    pub fn as_str(&self) -> &str {
        match self {
            ChatScope::Lobby => LOBBY_SCOPE,
            ChatScope::Poll(id) => id.as_str(),
        }
    }
}

impl fmt::Display for ChatScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds (JST).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a new Timestamp.
    ///
    /// # Arguments
    ///
    /// * `value` - Unix timestamp in milliseconds
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
