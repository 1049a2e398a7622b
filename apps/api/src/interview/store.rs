//! Per-student persistence of `InterviewSession` between requests.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use super::session::InterviewSession;

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Session encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the stored session, or a fresh one if none exists.
    async fn load(&self, student_id: &str) -> Result<InterviewSession, SessionStoreError>;

    async fn save(
        &self,
        student_id: &str,
        session: &InterviewSession,
    ) -> Result<(), SessionStoreError>;

    async fn remove(&self, student_id: &str) -> Result<(), SessionStoreError>;
}

/// Sessions as JSON strings under `interview:session:<student_id>`, expiring
/// after `ttl_secs` of inactivity.
pub struct RedisSessionStore {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisSessionStore {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }

    fn key(student_id: &str) -> String {
        format!("interview:session:{student_id}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, student_id: &str) -> Result<InterviewSession, SessionStoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::key(student_id))
            .query_async(&mut conn)
            .await?;

        match raw {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => {
                debug!("No interview session for {student_id}; starting fresh");
                Ok(InterviewSession::default())
            }
        }
    }

    async fn save(
        &self,
        student_id: &str,
        session: &InterviewSession,
    ) -> Result<(), SessionStoreError> {
        let json = serde_json::to_string(session)?;
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("SET")
            .arg(Self::key(student_id))
            .arg(json)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn remove(&self, student_id: &str) -> Result<(), SessionStoreError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("DEL")
            .arg(Self::key(student_id))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

/// Process-local store, used when no Redis URL is configured.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, InterviewSession>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, student_id: &str) -> Result<InterviewSession, SessionStoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(student_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save(
        &self,
        student_id: &str,
        session: &InterviewSession,
    ) -> Result<(), SessionStoreError> {
        self.sessions
            .write()
            .await
            .insert(student_id.to_string(), session.clone());
        Ok(())
    }

    async fn remove(&self, student_id: &str) -> Result<(), SessionStoreError> {
        self.sessions.write().await.remove(student_id);
        Ok(())
    }
}
