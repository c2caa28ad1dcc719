//! Caller checks shared by the event use cases.

use crate::{
    domain::{ConnectionId, Participant, SessionId},
    infrastructure::SessionRegistry,
};

use super::error::UseCaseError;

/// The caller's participant record, provided it joined `session_id`.
pub(crate) async fn member_of(
    registry: &SessionRegistry,
    connection_id: &ConnectionId,
    session_id: &SessionId,
) -> Result<Participant, UseCaseError> {
    let participant = registry
        .participant(connection_id)
        .await
        .ok_or(UseCaseError::NotJoined)?;
    if &participant.session_id != session_id {
        return Err(UseCaseError::NotAuthorized(format!(
            "not a member of session {session_id}"
        )));
    }
    Ok(participant)
}

pub(crate) async fn teacher_of(
    registry: &SessionRegistry,
    connection_id: &ConnectionId,
    session_id: &SessionId,
) -> Result<Participant, UseCaseError> {
    let participant = member_of(registry, connection_id, session_id).await?;
    if !participant.is_teacher() {
        return Err(UseCaseError::NotAuthorized(
            "only the teacher can do this".to_string(),
        ));
    }
    Ok(participant)
}

pub(crate) async fn student_of(
    registry: &SessionRegistry,
    connection_id: &ConnectionId,
    session_id: &SessionId,
) -> Result<Participant, UseCaseError> {
    let participant = member_of(registry, connection_id, session_id).await?;
    if !participant.is_student() {
        return Err(UseCaseError::NotAuthorized(
            "only students can vote".to_string(),
        ));
    }
    Ok(participant)
}
