//! Where sessions live. Handlers only see the [`SessionStore`] trait.
use super::Session;
use crate::error::AppError;
use crate::model;
use async_trait::async_trait;
use parking_lot::Mutex;
use sqlx::SqlitePool;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage failed: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for SessionError {
    fn from(e: sqlx::Error) -> Self {
        SessionError::Storage(e.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::internal("Error while accessing the sessions", e)
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: &Session) -> Result<(), SessionError>;
    async fn get(&self, token: &str) -> Result<Option<Session>, SessionError>;
    /// Moves `last_refresh` to `now`. False when the token is unknown.
    async fn touch(&self, token: &str, now: i64) -> Result<bool, SessionError>;
    /// False when there was nothing to remove.
    async fn remove(&self, token: &str) -> Result<bool, SessionError>;
    /// Removes every session last refreshed before `idle_since`, returns how many.
    async fn purge(&self, idle_since: i64) -> Result<u64, SessionError>;
}

/// Sessions kept in the `user_session` table, so they survive a restart.
pub struct SqliteSessionStore {
    db: SqlitePool,
}

impl SqliteSessionStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

fn session_model2schema(m: model::UserSession) -> Session {
    Session {
        token: m.api_key,
        user_id: m.user_id,
        aluno_id: m.aluno_id,
        nome: m.nome,
        created_at: m.time_of_creation,
        last_refresh: m.last_refresh,
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn insert(&self, session: &Session) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            INSERT INTO user_session(api_key, user_id, aluno_id, nome, time_of_creation, last_refresh)
            VALUES (?,?,?,?,?,?)
            "#,
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.aluno_id)
        .bind(&session.nome)
        .bind(session.created_at)
        .bind(session.last_refresh)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<Session>, SessionError> {
        let row = sqlx::query_as::<_, model::UserSession>(
            r#"
            SELECT api_key, user_id, aluno_id, nome, time_of_creation, last_refresh
            FROM user_session WHERE api_key = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(session_model2schema))
    }

    async fn touch(&self, token: &str, now: i64) -> Result<bool, SessionError> {
        let r = sqlx::query("UPDATE user_session SET last_refresh = ? WHERE api_key = ?")
            .bind(now)
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(r.rows_affected() == 1)
    }

    async fn remove(&self, token: &str) -> Result<bool, SessionError> {
        let r = sqlx::query("DELETE FROM user_session WHERE api_key = ?")
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(r.rows_affected() > 0)
    }

    async fn purge(&self, idle_since: i64) -> Result<u64, SessionError> {
        let r = sqlx::query("DELETE FROM user_session WHERE last_refresh < ?")
            .bind(idle_since)
            .execute(&self.db)
            .await?;
        Ok(r.rows_affected())
    }
}

/// Sessions in process memory; gone after a restart.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: &Session) -> Result<(), SessionError> {
        self.sessions
            .lock()
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<Session>, SessionError> {
        Ok(self.sessions.lock().get(token).cloned())
    }

    async fn touch(&self, token: &str, now: i64) -> Result<bool, SessionError> {
        match self.sessions.lock().get_mut(token) {
            Some(s) => {
                s.last_refresh = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, token: &str) -> Result<bool, SessionError> {
        Ok(self.sessions.lock().remove(token).is_some())
    }

    async fn purge(&self, idle_since: i64) -> Result<u64, SessionError> {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, s| s.last_refresh >= idle_since);
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{AlunoId, UserId};
    use crate::tests::seeded_db;

    fn session(token: &str) -> Session {
        Session {
            token: token.to_string(),
            user_id: UserId(1),
            aluno_id: AlunoId(1),
            nome: "Maria Aparecida Souza".to_string(),
            created_at: 100,
            last_refresh: 100,
        }
    }

    async fn exercise(store: &dyn SessionStore) {
        assert_eq!(store.get("abc").await.unwrap(), None);
        store.insert(&session("abc")).await.unwrap();
        assert_eq!(store.get("abc").await.unwrap(), Some(session("abc")));

        assert!(store.touch("abc", 500).await.unwrap());
        assert_eq!(store.get("abc").await.unwrap().unwrap().last_refresh, 500);
        assert!(!store.touch("nope", 500).await.unwrap());

        assert!(store.remove("abc").await.unwrap());
        assert!(!store.remove("abc").await.unwrap());
        assert_eq!(store.get("abc").await.unwrap(), None);

        store.insert(&session("old")).await.unwrap();
        store.insert(&session("kept")).await.unwrap();
        store.touch("kept", 300).await.unwrap();
        assert_eq!(store.purge(300).await.unwrap(), 1);
        assert_eq!(store.get("old").await.unwrap(), None);
        assert!(store.get("kept").await.unwrap().is_some());
        assert_eq!(store.purge(300).await.unwrap(), 0);
    }

    #[actix_rt::test]
    async fn memory_store() {
        exercise(&MemorySessionStore::new()).await;
    }

    #[actix_rt::test]
    async fn sqlite_store() {
        // the session row references a seeded account
        let db = seeded_db().await;
        exercise(&SqliteSessionStore::new(db)).await;
    }
}
