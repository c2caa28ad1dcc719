//! Session registry.
//!
//! Tracks live transport connections, which session each one has joined, and
//! the participants of every session (the broadcast groups).
//!
//! Each session has its own lock; the connection index is only held for short
//! lookups and never while a session lock is being acquired, so operations on
//! different sessions do not block each other.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, RwLock, mpsc};

use kyoshitsu_shared::time::get_jst_timestamp;

use crate::domain::{ConnectionId, Participant, ParticipantName, Role, SessionError, SessionId, Timestamp};

/// Outbound channel of one connection (serialized JSON frames)
pub type ConnectionSender = mpsc::UnboundedSender<String>;

struct Member {
    participant: Participant,
    sender: ConnectionSender,
}

/// Members of one session, in join order
#[derive(Default)]
struct Room {
    members: Vec<Member>,
}

impl Room {
    fn remove(&mut self, connection_id: &ConnectionId) -> Option<Member> {
        let index = self
            .members
            .iter()
            .position(|m| &m.participant.connection_id == connection_id)?;
        Some(self.members.remove(index))
    }
}

struct Connection {
    sender: ConnectionSender,
    session: Option<SessionId>,
}

/// Registry of connections and session membership.
#[derive(Default)]
pub struct SessionRegistry {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
    rooms: RwLock<HashMap<SessionId, Arc<Mutex<Room>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live connection that has not joined a session yet.
    pub async fn connect(&self, connection_id: ConnectionId, sender: ConnectionSender) {
        let mut connections = self.connections.write().await;
        connections.insert(
            connection_id,
            Connection {
                sender,
                session: None,
            },
        );
    }

    /// Join a session.
    ///
    /// The name is normalized (trimmed, lower-cased). Students must supply a
    /// name, and it must not collide with another connected student of the same
    /// session. Teachers without a name are called `teacher`. A connection that
    /// is already in a session leaves it first.
    ///
    /// # Errors
    ///
    /// * `SessionError::ConnectionNotFound` - the connection was never registered
    /// * `SessionError::StudentNameRequired` - student without a name
    /// * `SessionError::InvalidName` - name too long
    /// * `SessionError::DuplicateName` - name already taken in the session
    pub async fn join(
        &self,
        connection_id: &ConnectionId,
        session_id: &SessionId,
        role: Role,
        name: Option<&str>,
    ) -> Result<Participant, SessionError> {
        let name = normalize_name(role, name)?;

        let (sender, previous) = {
            let connections = self.connections.read().await;
            let connection = connections
                .get(connection_id)
                .ok_or_else(|| SessionError::ConnectionNotFound(connection_id.to_string()))?;
            (connection.sender.clone(), connection.session.clone())
        };

        if let Some(previous) = previous {
            self.remove_from_room(&previous, connection_id).await;
        }

        let participant = Participant::new(
            connection_id.clone(),
            name,
            role,
            session_id.clone(),
            Timestamp::new(get_jst_timestamp()),
        );

        {
            let room = self.room(session_id).await;
            let mut room = room.lock().await;
            let taken = role == Role::Student
                && room.members.iter().any(|m| {
                    m.participant.is_student() && m.participant.name == participant.name
                });
            if taken {
                drop(room);
                self.set_session(connection_id, None).await;
                return Err(SessionError::DuplicateName(
                    participant.name.as_str().to_string(),
                ));
            }
            room.members.push(Member {
                participant: participant.clone(),
                sender,
            });
        }

        self.set_session(connection_id, Some(session_id.clone())).await;
        tracing::debug!(
            connection_id = %connection_id,
            session_id = %session_id,
            name = %participant.name,
            role = %role,
            "Participant joined"
        );
        Ok(participant)
    }

    /// Leave the current session.
    ///
    /// Idempotent: unknown connections and connections outside any session are a no-op.
    /// Returns the vacated session so callers can re-broadcast presence.
    pub async fn leave(&self, connection_id: &ConnectionId) -> Option<SessionId> {
        let session_id = {
            let mut connections = self.connections.write().await;
            connections.get_mut(connection_id)?.session.take()?
        };
        self.remove_from_room(&session_id, connection_id).await;
        Some(session_id)
    }

    /// Leave the current session and forget the connection.
    pub async fn disconnect(&self, connection_id: &ConnectionId) -> Option<SessionId> {
        let vacated = self.leave(connection_id).await;
        self.connections.write().await.remove(connection_id);
        vacated
    }

    /// Participant bound to a connection, if it has joined a session.
    pub async fn participant(&self, connection_id: &ConnectionId) -> Option<Participant> {
        let session_id = {
            let connections = self.connections.read().await;
            connections.get(connection_id)?.session.clone()?
        };
        let room = self.existing_room(&session_id).await?;
        let room = room.lock().await;
        room.members
            .iter()
            .find(|m| &m.participant.connection_id == connection_id)
            .map(|m| m.participant.clone())
    }

    /// Participants of a session in join order.
    pub async fn list_participants(&self, session_id: &SessionId) -> Vec<Participant> {
        let Some(room) = self.existing_room(session_id).await else {
            return Vec::new();
        };
        let room = room.lock().await;
        room.members.iter().map(|m| m.participant.clone()).collect()
    }

    /// Remove a student from the caller's session.
    ///
    /// `notify` is called with the target and its sender before membership is
    /// revoked, so a notice sent there is delivered ahead of any later session event.
    ///
    /// # Errors
    ///
    /// * `SessionError::NotAuthorized` - the caller is not a teacher in a session,
    ///   or the target is a teacher
    /// * `SessionError::ParticipantNotFound` - the target is not in the caller's session
    pub async fn evict<F>(
        &self,
        by: &ConnectionId,
        target: &ConnectionId,
        notify: F,
    ) -> Result<Participant, SessionError>
    where
        F: FnOnce(&Participant, &ConnectionSender),
    {
        let caller = self
            .participant(by)
            .await
            .ok_or_else(|| SessionError::NotAuthorized("join a session first".to_string()))?;
        if !caller.is_teacher() {
            return Err(SessionError::NotAuthorized(
                "only the teacher can remove students".to_string(),
            ));
        }

        let removed = {
            let room = self
                .existing_room(&caller.session_id)
                .await
                .ok_or_else(|| SessionError::ParticipantNotFound(target.to_string()))?;
            let mut room = room.lock().await;
            let member = room
                .members
                .iter()
                .find(|m| &m.participant.connection_id == target)
                .ok_or_else(|| SessionError::ParticipantNotFound(target.to_string()))?;
            if member.participant.is_teacher() {
                return Err(SessionError::NotAuthorized(
                    "teachers cannot be removed".to_string(),
                ));
            }
            notify(&member.participant, &member.sender);
            room.remove(target)
                .map(|m| m.participant)
                .ok_or_else(|| SessionError::ParticipantNotFound(target.to_string()))?
        };

        {
            let mut connections = self.connections.write().await;
            if let Some(connection) = connections.get_mut(target)
                && connection.session.as_ref() == Some(&caller.session_id)
            {
                connection.session = None;
            }
        }

        tracing::info!(
            by = %by,
            target = %target,
            session_id = %caller.session_id,
            "Participant evicted"
        );
        Ok(removed)
    }

    /// Senders of every member of a session.
    pub async fn session_senders(&self, session_id: &SessionId) -> Vec<(ConnectionId, ConnectionSender)> {
        let Some(room) = self.existing_room(session_id).await else {
            return Vec::new();
        };
        let room = room.lock().await;
        room.members
            .iter()
            .map(|m| (m.participant.connection_id.clone(), m.sender.clone()))
            .collect()
    }

    /// Sender of one connection, whether or not it joined a session.
    pub async fn connection_sender(&self, connection_id: &ConnectionId) -> Option<ConnectionSender> {
        let connections = self.connections.read().await;
        connections.get(connection_id).map(|c| c.sender.clone())
    }

    pub async fn count_connections(&self) -> usize {
        self.connections.read().await.len()
    }

    async fn room(&self, session_id: &SessionId) -> Arc<Mutex<Room>> {
        if let Some(room) = self.existing_room(session_id).await {
            return room;
        }
        let mut rooms = self.rooms.write().await;
        rooms.entry(session_id.clone()).or_default().clone()
    }

    async fn existing_room(&self, session_id: &SessionId) -> Option<Arc<Mutex<Room>>> {
        self.rooms.read().await.get(session_id).cloned()
    }

    async fn remove_from_room(&self, session_id: &SessionId, connection_id: &ConnectionId) {
        if let Some(room) = self.existing_room(session_id).await {
            room.lock().await.remove(connection_id);
        }
    }

    async fn set_session(&self, connection_id: &ConnectionId, session: Option<SessionId>) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(connection_id) {
            connection.session = session;
        }
    }
}

fn normalize_name(role: Role, name: Option<&str>) -> Result<ParticipantName, SessionError> {
    let raw = name.map(str::trim).filter(|n| !n.is_empty());
    match (role, raw) {
        (Role::Student, None) => Err(SessionError::StudentNameRequired),
        (Role::Teacher, None) => Ok(ParticipantName::new(ParticipantName::DEFAULT_TEACHER)?),
        (_, Some(raw)) => Ok(ParticipantName::new(raw)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConnectionIdFactory;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - 参加（名前の正規化、生徒名の重複拒否）
    // - 退出の冪等性、切断後の名前の再利用
    // - 教師による生徒の強制退出（権限・対象の検証、通知→削除の順序）
    //
    // 【なぜこのテストが必要か】
    // - セッション内の生徒名の一意性は唯一の本人確認手段である
    // ========================================

    fn session(id: &str) -> SessionId {
        SessionId::new(id.to_string()).unwrap()
    }

    async fn connected(
        registry: &SessionRegistry,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let id = ConnectionIdFactory::generate();
        let (tx, rx) = mpsc::unbounded_channel();
        registry.connect(id.clone(), tx).await;
        (id, rx)
    }

    #[tokio::test]
    async fn test_join_normalizes_name() {
        // テスト項目: 参加時に名前が trim + 小文字化される
        // given (前提条件):
        let registry = SessionRegistry::new();
        let (conn, _rx) = connected(&registry).await;

        // when (操作):
        let participant = registry
            .join(&conn, &session("s1"), Role::Student, Some("  Alice "))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(participant.name.as_str(), "alice");
        assert_eq!(registry.list_participants(&session("s1")).await.len(), 1);
    }

    #[tokio::test]
    async fn test_join_student_requires_name() {
        // テスト項目: 生徒は名前なしでは参加できず、教師は "teacher" になる
        // given (前提条件):
        let registry = SessionRegistry::new();
        let (student, _rx1) = connected(&registry).await;
        let (teacher, _rx2) = connected(&registry).await;

        // when (操作):
        let student_result = registry
            .join(&student, &session("s1"), Role::Student, Some("  "))
            .await;
        let teacher_result = registry
            .join(&teacher, &session("s1"), Role::Teacher, None)
            .await;

        // then (期待する結果):
        assert_eq!(student_result, Err(SessionError::StudentNameRequired));
        assert_eq!(teacher_result.unwrap().name.as_str(), "teacher");
    }

    #[tokio::test]
    async fn test_join_duplicate_student_name_rejected() {
        // テスト項目: 同じセッションで同じ名前（大文字小文字無視）の生徒は拒否される
        // given (前提条件):
        let registry = SessionRegistry::new();
        let (first, _rx1) = connected(&registry).await;
        let (second, _rx2) = connected(&registry).await;
        let (other_session, _rx3) = connected(&registry).await;
        registry
            .join(&first, &session("s1"), Role::Student, Some("bob"))
            .await
            .unwrap();

        // when (操作):
        let duplicate = registry
            .join(&second, &session("s1"), Role::Student, Some("BOB"))
            .await;
        let elsewhere = registry
            .join(&other_session, &session("s2"), Role::Student, Some("bob"))
            .await;

        // then (期待する結果):
        assert_eq!(duplicate, Err(SessionError::DuplicateName("bob".to_string())));
        assert!(elsewhere.is_ok());
        assert_eq!(registry.list_participants(&session("s1")).await.len(), 1);
        assert!(registry.participant(&second).await.is_none());
    }

    #[tokio::test]
    async fn test_leave_is_idempotent() {
        // テスト項目: 退出は冪等で、2 回目や未知の接続は何もしない
        // given (前提条件):
        let registry = SessionRegistry::new();
        let (conn, _rx) = connected(&registry).await;
        registry
            .join(&conn, &session("s1"), Role::Student, Some("alice"))
            .await
            .unwrap();

        // when (操作):
        let first = registry.leave(&conn).await;
        let second = registry.leave(&conn).await;
        let unknown = registry.leave(&ConnectionIdFactory::generate()).await;

        // then (期待する結果):
        assert_eq!(first, Some(session("s1")));
        assert_eq!(second, None);
        assert_eq!(unknown, None);
        assert!(registry.list_participants(&session("s1")).await.is_empty());
    }

    #[tokio::test]
    async fn test_name_is_reusable_after_disconnect() {
        // テスト項目: 切断・強制退出で空いた名前は再び使える
        // given (前提条件):
        let registry = SessionRegistry::new();
        let (teacher, _rx0) = connected(&registry).await;
        let (old_bob, _rx1) = connected(&registry).await;
        let (carol, _rx2) = connected(&registry).await;
        registry
            .join(&teacher, &session("s1"), Role::Teacher, None)
            .await
            .unwrap();
        registry
            .join(&old_bob, &session("s1"), Role::Student, Some("bob"))
            .await
            .unwrap();
        registry
            .join(&carol, &session("s1"), Role::Student, Some("carol"))
            .await
            .unwrap();
        registry.disconnect(&old_bob).await;
        registry.evict(&teacher, &carol, |_, _| {}).await.unwrap();

        // when (操作):
        let (new_bob, _rx3) = connected(&registry).await;
        let (new_carol, _rx4) = connected(&registry).await;
        let bob = registry
            .join(&new_bob, &session("s1"), Role::Student, Some("Bob"))
            .await;
        let carol_again = registry
            .join(&new_carol, &session("s1"), Role::Student, Some("carol"))
            .await;

        // then (期待する結果):
        assert!(bob.is_ok());
        assert!(carol_again.is_ok());
    }

    #[tokio::test]
    async fn test_rejoin_moves_connection_between_sessions() {
        // テスト項目: 別セッションに参加し直すと元のセッションから抜ける
        // given (前提条件):
        let registry = SessionRegistry::new();
        let (conn, _rx) = connected(&registry).await;
        registry
            .join(&conn, &session("s1"), Role::Student, Some("alice"))
            .await
            .unwrap();

        // when (操作):
        registry
            .join(&conn, &session("s2"), Role::Student, Some("alice"))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(registry.list_participants(&session("s1")).await.is_empty());
        assert_eq!(registry.list_participants(&session("s2")).await.len(), 1);
    }

    #[tokio::test]
    async fn test_list_participants_in_join_order() {
        // テスト項目: 参加者一覧は参加順
        // given (前提条件):
        let registry = SessionRegistry::new();
        let mut receivers = Vec::new();
        for name in ["charlie", "alice", "bob"] {
            let (conn, rx) = connected(&registry).await;
            receivers.push(rx);
            registry
                .join(&conn, &session("s1"), Role::Student, Some(name))
                .await
                .unwrap();
        }

        // when (操作):
        let names: Vec<String> = registry
            .list_participants(&session("s1"))
            .await
            .into_iter()
            .map(|p| p.name.into_string())
            .collect();

        // then (期待する結果):
        assert_eq!(names, vec!["charlie", "alice", "bob"]);
    }

    #[tokio::test]
    async fn test_evict_requires_teacher() {
        // テスト項目: 教師以外は強制退出できない
        // given (前提条件):
        let registry = SessionRegistry::new();
        let (alice, _rx1) = connected(&registry).await;
        let (bob, _rx2) = connected(&registry).await;
        for (conn, name) in [(&alice, "alice"), (&bob, "bob")] {
            registry
                .join(conn, &session("s1"), Role::Student, Some(name))
                .await
                .unwrap();
        }

        // when (操作):
        let result = registry.evict(&alice, &bob, |_, _| {}).await;

        // then (期待する結果):
        assert!(matches!(result, Err(SessionError::NotAuthorized(_))));
        assert_eq!(registry.list_participants(&session("s1")).await.len(), 2);
    }

    #[tokio::test]
    async fn test_evict_target_in_other_session_not_found() {
        // テスト項目: 別セッションの生徒は強制退出できない
        // given (前提条件):
        let registry = SessionRegistry::new();
        let (teacher, _rx1) = connected(&registry).await;
        let (student, _rx2) = connected(&registry).await;
        registry
            .join(&teacher, &session("s1"), Role::Teacher, None)
            .await
            .unwrap();
        registry
            .join(&student, &session("s2"), Role::Student, Some("alice"))
            .await
            .unwrap();

        // when (操作):
        let result = registry.evict(&teacher, &student, |_, _| {}).await;

        // then (期待する結果):
        assert!(matches!(result, Err(SessionError::ParticipantNotFound(_))));
        assert!(registry.participant(&student).await.is_some());
    }

    #[tokio::test]
    async fn test_evict_notifies_before_removal() {
        // テスト項目: 強制退出は通知してから削除する
        // given (前提条件):
        let registry = SessionRegistry::new();
        let (teacher, _rx1) = connected(&registry).await;
        let (student, mut student_rx) = connected(&registry).await;
        registry
            .join(&teacher, &session("s1"), Role::Teacher, None)
            .await
            .unwrap();
        registry
            .join(&student, &session("s1"), Role::Student, Some("alice"))
            .await
            .unwrap();

        // when (操作):
        let removed = registry
            .evict(&teacher, &student, |participant, sender| {
                let _ = sender.send(format!("bye {}", participant.name));
            })
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(removed.name.as_str(), "alice");
        assert_eq!(student_rx.recv().await.unwrap(), "bye alice");
        assert!(registry.participant(&student).await.is_none());
        assert_eq!(registry.list_participants(&session("s1")).await.len(), 1);
        // 接続自体は残る
        assert!(registry.connection_sender(&student).await.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_joins_with_same_name() {
        // テスト項目: 同名の生徒が同時に参加しても 1 人だけが成功する
        // given (前提条件):
        let registry = Arc::new(SessionRegistry::new());
        let mut connections = Vec::new();
        for _ in 0..16 {
            connections.push(connected(&registry).await);
        }

        // when (操作):
        let mut handles = Vec::new();
        for (conn, _) in &connections {
            let registry = registry.clone();
            let conn = conn.clone();
            handles.push(tokio::spawn(async move {
                registry
                    .join(&conn, &session("s1"), Role::Student, Some("dave"))
                    .await
            }));
        }
        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        // then (期待する結果):
        assert_eq!(successes, 1);
        assert_eq!(registry.list_participants(&session("s1")).await.len(), 1);
    }
}
