use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::SessionState;
use crate::services::SessionStateMachine;

const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(30 * 60);

/// One wizard session
///
/// The mutex serializes transitions within the session.
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub state: Mutex<SessionState>,
    last_active: Mutex<Instant>,
}

impl Session {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            state: Mutex::new(SessionState::new()),
            last_active: Mutex::new(Instant::now()),
        }
    }

    async fn touch(&self) {
        *self.last_active.lock().await = Instant::now();
    }

    async fn idle_for(&self) -> Duration {
        self.last_active.lock().await.elapsed()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub machine: Arc<SessionStateMachine>,
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Session>>>>,
    idle_ttl: Duration,
}

impl AppState {
    /// Creates an application state with no sessions
    pub fn new(machine: SessionStateMachine) -> Self {
        Self {
            machine: Arc::new(machine),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl: DEFAULT_IDLE_TTL,
        }
    }

    /// Sets how long a session may go untouched before it is dropped
    pub fn with_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        self.idle_ttl = idle_ttl;
        self
    }

    /// Registers a fresh session, dropping idle ones first
    pub async fn create_session(&self) -> Arc<Session> {
        self.prune_idle_sessions().await;

        let session = Arc::new(Session::new());

        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id, Arc::clone(&session));

        tracing::info!(session_id = %session.id, active = sessions.len(), "Session created");

        session
    }

    /// Looks up a session and marks it active
    pub async fn session(&self, id: Uuid) -> AppResult<Arc<Session>> {
        let session = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {} does not exist", id)))?;

        session.touch().await;
        Ok(session)
    }

    pub async fn remove_session(&self, id: Uuid) -> AppResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(&id).is_none() {
            return Err(AppError::NotFound(format!("Session {} does not exist", id)));
        }

        tracing::info!(session_id = %id, active = sessions.len(), "Session removed");
        Ok(())
    }

    /// Drops every session idle for at least the configured TTL
    pub async fn prune_idle_sessions(&self) -> usize {
        let mut sessions = self.sessions.write().await;

        let mut expired = Vec::new();
        for (id, session) in sessions.iter() {
            if session.idle_for().await >= self.idle_ttl {
                expired.push(*id);
            }
        }

        for id in &expired {
            sessions.remove(id);
        }

        if !expired.is_empty() {
            tracing::info!(
                evicted = expired.len(),
                active = sessions.len(),
                idle_ttl_secs = self.idle_ttl.as_secs(),
                "Idle sessions evicted"
            );
        }

        expired.len()
    }

    /// Prunes idle sessions on a fixed interval for the life of the process
    pub fn spawn_session_reaper(&self, every: Duration) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                state.prune_idle_sessions().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{MockMetadataProvider, MockTextGenerator};
    use crate::services::questionnaire::MockQuestionSource;
    use crate::services::{EnrichmentPipeline, RecommendationEngine, RetryPolicy};

    const TTL: Duration = Duration::from_secs(60);

    fn idle_machine() -> SessionStateMachine {
        let generator = Arc::new(MockTextGenerator::new());
        SessionStateMachine::new(
            Arc::new(MockQuestionSource::new()),
            RecommendationEngine::new(generator.clone(), Duration::from_secs(1)),
            Arc::new(EnrichmentPipeline::new(
                generator,
                Arc::new(MockMetadataProvider::new()),
                "http://images.test".to_string(),
                Duration::from_secs(1),
            )),
            RetryPolicy::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_is_evicted() {
        let state = AppState::new(idle_machine()).with_idle_ttl(TTL);
        let idle = state.create_session().await;
        let active = state.create_session().await;

        tokio::time::advance(Duration::from_secs(45)).await;
        state.session(active.id).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(state.prune_idle_sessions().await, 1);
        assert!(matches!(state.session(idle.id).await, Err(AppError::NotFound(_))));
        assert!(state.session(active.id).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_session_prunes_expired() {
        let state = AppState::new(idle_machine()).with_idle_ttl(TTL);
        let stale = state.create_session().await;

        tokio::time::advance(TTL).await;
        let fresh = state.create_session().await;

        assert!(state.session(stale.id).await.is_err());
        assert!(state.session(fresh.id).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_evicts_in_background() {
        let state = AppState::new(idle_machine()).with_idle_ttl(TTL);
        let session = state.create_session().await;
        let reaper = state.spawn_session_reaper(Duration::from_secs(10));

        tokio::time::sleep(TTL + Duration::from_secs(15)).await;

        assert!(state.session(session.id).await.is_err());
        reaper.abort();
    }

    #[tokio::test]
    async fn test_remove_unknown_session() {
        let state = AppState::new(idle_machine());
        assert!(matches!(
            state.remove_session(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }
}
