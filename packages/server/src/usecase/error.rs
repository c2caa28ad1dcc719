//! UseCase 層のエラー定義

use std::fmt;

use thiserror::Error;

use crate::domain::{PollError, RepositoryError, SessionError, ValueObjectError};

/// エラーの分類（クライアントへの `error` イベントに含める）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// 不正な入力（変更前に拒否）
    Validation,
    /// 同時利用による正当な競合
    Conflict,
    NotFound,
    /// 権限のない操作
    NotAuthorized,
    /// 外部ストアの障害
    Persistence,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::NotFound => "notFound",
            ErrorCategory::NotAuthorized => "notAuthorized",
            ErrorCategory::Persistence => "persistence",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UseCase 実行時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UseCaseError {
    #[error(transparent)]
    InvalidInput(#[from] ValueObjectError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("An active poll already exists in session {0}")]
    ActivePollExists(String),

    #[error("Poll not found: {0}")]
    PollNotFound(String),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// 参加前の接続からの操作
    #[error("Join a session first")]
    NotJoined,

    #[error("Storage error: {0}")]
    Persistence(String),
}

impl From<RepositoryError> for UseCaseError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::PollNotFound(id) => UseCaseError::PollNotFound(id),
            RepositoryError::Unavailable(reason) => UseCaseError::Persistence(reason),
        }
    }
}

impl UseCaseError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            UseCaseError::InvalidInput(_) => ErrorCategory::Validation,
            UseCaseError::Poll(e) => match e {
                PollError::PollEnded | PollError::DuplicateVote(_) | PollError::AlreadyEnded => {
                    ErrorCategory::Conflict
                }
                _ => ErrorCategory::Validation,
            },
            UseCaseError::Session(e) => match e {
                SessionError::StudentNameRequired | SessionError::InvalidName(_) => {
                    ErrorCategory::Validation
                }
                SessionError::DuplicateName(_) => ErrorCategory::Conflict,
                SessionError::NotAuthorized(_) => ErrorCategory::NotAuthorized,
                SessionError::ParticipantNotFound(_) | SessionError::ConnectionNotFound(_) => {
                    ErrorCategory::NotFound
                }
            },
            UseCaseError::ActivePollExists(_) => ErrorCategory::Conflict,
            UseCaseError::PollNotFound(_) => ErrorCategory::NotFound,
            UseCaseError::NotAuthorized(_) | UseCaseError::NotJoined => {
                ErrorCategory::NotAuthorized
            }
            UseCaseError::Persistence(_) => ErrorCategory::Persistence,
        }
    }

    /// クライアント側の誤りか（サーバ側の障害ではない）
    pub fn is_client_fault(&self) -> bool {
        self.category() != ErrorCategory::Persistence
    }
}
