use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::timer::TurnTimers;
use party_core::{
    ContentPool, ContentProvider, EngineEvent, EngineEventHandler, NoContent, PoolSampler,
    RoundEngine,
};
use party_types::{EngineError, GameConfig, OutcomeEvent, Phase, PlayerId, Snapshot, TurnToken};

pub type SessionId = Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session {0} not found")]
    NotFound(SessionId),
    #[error("Session asks for content but no content pool is loaded")]
    NoContentPool,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Writes engine events to the log, tagged with their session.
struct LoggingEventHandler {
    session_id: SessionId,
}

impl EngineEventHandler for LoggingEventHandler {
    fn handle_event(&mut self, event: EngineEvent) {
        match &event {
            EngineEvent::SessionStarted { players, total_rounds } => info!(
                "Session {} started: {} players, {} rounds",
                self.session_id,
                players.len(),
                total_rounds
            ),
            EngineEvent::PlayerEliminated { player_id, by_judge, .. } => info!(
                "Session {}: player {} eliminated (judge: {})",
                self.session_id, player_id, by_judge
            ),
            EngineEvent::GameCompleted { standings } => info!(
                "Session {} finished, winner: {}",
                self.session_id,
                standings
                    .first()
                    .map(|s| s.player.name.as_str())
                    .unwrap_or("nobody")
            ),
            other => debug!("Session {}: {}", self.session_id, other.name()),
        }
    }
}

struct ActiveSession {
    engine: RoundEngine,
    timers: TurnTimers,
    last_activity: Instant,
}

impl ActiveSession {
    fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

/// Owns one engine per game screen and drives its timers.
///
/// Cloning is cheap; clones share the same sessions. Countdown and
/// auto-advance tasks hold a clone and lock the session when they fire.
#[derive(Clone, Default)]
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<SessionId, ActiveSession>>>,
    content: Option<Arc<ContentPool>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: Arc<ContentPool>) -> Self {
        Self {
            sessions: Arc::default(),
            content: Some(content),
        }
    }

    pub async fn create_session(&self, config: GameConfig) -> Result<SessionId, SessionError> {
        let provider: Box<dyn ContentProvider> = match (&config.content, &self.content) {
            (None, _) => Box::new(NoContent),
            (Some(_), Some(pool)) => Box::new(PoolSampler::new(pool.clone())),
            (Some(_), None) => return Err(SessionError::NoContentPool),
        };

        let session_id = Uuid::new_v4();
        let mut engine = RoundEngine::start(config, provider)?;
        engine.subscribe(Box::new(LoggingEventHandler { session_id }));

        let session = ActiveSession {
            engine,
            timers: TurnTimers::new(),
            last_activity: Instant::now(),
        };
        self.sessions.lock().await.insert(session_id, session);

        info!("Created session {}", session_id);
        Ok(session_id)
    }

    pub async fn begin(&self, session_id: SessionId) -> Result<bool, SessionError> {
        self.with_session(session_id, |session| {
            session.update_activity();
            session.engine.begin()
        })
        .await
    }

    /// Open the answer window and arm the countdown, if the game has one.
    pub async fn open_input(&self, session_id: SessionId) -> Result<Option<TurnToken>, SessionError> {
        self.with_session(session_id, |session| {
            session.update_activity();
            let token = session.engine.open_input()?;
            self.arm_countdown(session_id, session, token);
            Some(token)
        })
        .await
    }

    pub async fn submit_outcome(
        &self,
        session_id: SessionId,
        outcome: OutcomeEvent,
    ) -> Result<bool, SessionError> {
        self.with_session(session_id, |session| {
            session.update_activity();
            let applied = session.engine.submit_outcome(outcome);
            if applied {
                session.timers.cancel_countdown();
                self.follow_up(session_id, session);
            }
            applied
        })
        .await
    }

    pub async fn use_hint(&self, session_id: SessionId) -> Result<bool, SessionError> {
        self.with_session(session_id, |session| {
            session.update_activity();
            session.engine.use_hint()
        })
        .await
    }

    /// Manual advance. Overrides a pending auto-advance.
    pub async fn advance(&self, session_id: SessionId) -> Result<bool, SessionError> {
        self.with_session(session_id, |session| {
            session.update_activity();
            let advanced = session.engine.advance();
            if advanced {
                session.timers.cancel_auto_advance();
            }
            advanced
        })
        .await
    }

    pub async fn eliminate(
        &self,
        session_id: SessionId,
        player_id: PlayerId,
    ) -> Result<bool, SessionError> {
        self.with_session(session_id, |session| {
            session.update_activity();
            let applied = session.engine.eliminate(player_id);
            if applied && session.engine.live_token().is_none() {
                session.timers.cancel_countdown();
                self.follow_up(session_id, session);
            }
            applied
        })
        .await
    }

    pub async fn snapshot(&self, session_id: SessionId) -> Result<Snapshot, SessionError> {
        self.with_session(session_id, |session| session.engine.snapshot())
            .await
    }

    /// Drop a session, e.g. when the player navigates away. Pending timers
    /// are aborted with it.
    pub async fn close_session(&self, session_id: SessionId) -> bool {
        let removed = self.sessions.lock().await.remove(&session_id).is_some();
        if removed {
            info!("Closed session {}", session_id);
        }
        removed
    }

    pub async fn cleanup_idle_sessions(&self, timeout: Duration) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|session_id, session| {
            let keep = !session.is_expired(timeout);
            if !keep {
                info!("Removed idle session {}", session_id);
            }
            keep
        });
        before - sessions.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    async fn with_session<T>(
        &self,
        session_id: SessionId,
        f: impl FnOnce(&mut ActiveSession) -> T,
    ) -> Result<T, SessionError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&session_id)
            .ok_or(SessionError::NotFound(session_id))?;
        Ok(f(session))
    }

    /// Arm whatever the engine is waiting on after a resolution: a fresh
    /// countdown for a rebound, or the reading delay in RESOLVE.
    fn follow_up(&self, session_id: SessionId, session: &mut ActiveSession) {
        match session.engine.phase() {
            Phase::Input => {
                if let Some(token) = session.engine.live_token() {
                    self.arm_countdown(session_id, session, token);
                }
            }
            Phase::Resolve => self.schedule_auto_advance(session_id, session),
            Phase::GameEnd => session.timers.cancel_all(),
            _ => {}
        }
    }

    fn arm_countdown(&self, session_id: SessionId, session: &mut ActiveSession, token: TurnToken) {
        let Some(limit) = session.engine.time_limit() else {
            return;
        };
        let manager = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            manager.expire_turn(session_id, token).await;
        });
        session.timers.arm_countdown(token.serial, handle);
    }

    async fn expire_turn(&self, session_id: SessionId, token: TurnToken) {
        let mut sessions = self.sessions.lock().await;
        let Some(session) = sessions.get_mut(&session_id) else {
            return;
        };
        session.timers.release_countdown(token.serial);

        if session.engine.expire(token) {
            info!("Session {}: turn {} timed out", session_id, token.serial);
            self.follow_up(session_id, session);
        } else {
            debug!("Session {}: late countdown for turn {}", session_id, token.serial);
        }
    }

    fn schedule_auto_advance(&self, session_id: SessionId, session: &mut ActiveSession) {
        let Some(delay) = session.engine.resolve_delay() else {
            return;
        };
        let serial = session.engine.turn_serial();
        let manager = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            manager.auto_advance(session_id, serial).await;
        });
        session.timers.arm_auto_advance(serial, handle);
    }

    async fn auto_advance(&self, session_id: SessionId, serial: u64) {
        let mut sessions = self.sessions.lock().await;
        let Some(session) = sessions.get_mut(&session_id) else {
            return;
        };
        session.timers.release_auto_advance(serial);

        // Someone already moved on by hand
        if session.engine.phase() != Phase::Resolve || session.engine.turn_serial() != serial {
            return;
        }
        session.engine.advance();
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("content_items", &self.content.as_ref().map(|pool| pool.len()))
            .finish()
    }
}
