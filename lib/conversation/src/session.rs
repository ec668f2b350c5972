//! Conversation session management.
//!
//! Each session owns one conversation engine. Sessions share the tool
//! registry and the system prompt; histories are never shared. Turns on one
//! session queue behind that session's lock, while different sessions run
//! independently.
//!
//! The manager holds at most [`SessionLimits::max_sessions`] sessions and
//! evicts those idle past [`SessionLimits::idle_timeout`] whenever
//! [`SessionManager::cleanup_expired`] runs or the manager is full.

use crate::engine::ConversationEngine;
use crate::error::SessionError;
use crate::tool::ToolRegistry;
use frontdesk_ai::{ChatBackend, LlmBackendConfig, LlmError, OpenAiBackend};
use frontdesk_core::SessionId;
use rootcause::prelude::Report;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, warn};

/// Credentials supplied when a session is initialized.
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    api_key: Option<String>,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ProviderCredentials {
    /// Credentials carrying an API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
        }
    }

    /// Credentials with no key, deferring to whatever the factory is configured with.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns the API key if present and non-blank.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Builds a provider backend for a new session.
pub trait BackendFactory: Send + Sync {
    /// Creates a backend authenticated with `credentials`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::MissingCredentials`] when no usable key is
    /// available, or another error if the backend cannot be built.
    fn create(&self, credentials: &ProviderCredentials) -> Result<Arc<dyn ChatBackend>, LlmError>;
}

/// Factory for OpenAI-compatible backends.
#[derive(Debug, Clone)]
pub struct OpenAiBackendFactory {
    config: LlmBackendConfig,
}

impl OpenAiBackendFactory {
    /// Creates a factory. A key in `config` is used when a session supplies none.
    #[must_use]
    pub fn new(config: LlmBackendConfig) -> Self {
        Self { config }
    }
}

impl BackendFactory for OpenAiBackendFactory {
    fn create(&self, credentials: &ProviderCredentials) -> Result<Arc<dyn ChatBackend>, LlmError> {
        let config = match credentials.api_key() {
            Some(key) => self.config.clone().with_api_key(key),
            None => self.config.clone(),
        };
        Ok(Arc::new(OpenAiBackend::new(config)?))
    }
}

type SharedEngine = Arc<Mutex<ConversationEngine>>;

/// Bounds on how many sessions are kept and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Most sessions held at once.
    pub max_sessions: usize,
    /// Sessions idle for longer than this are evicted.
    pub idle_timeout: Duration,
}

impl SessionLimits {
    /// Default cap on live sessions.
    pub const DEFAULT_MAX_SESSIONS: usize = 1000;
    /// Default idle timeout.
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(3600);
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_sessions: Self::DEFAULT_MAX_SESSIONS,
            idle_timeout: Self::DEFAULT_IDLE_TIMEOUT,
        }
    }
}

struct Session {
    engine: SharedEngine,
    last_active: Instant,
}

impl Session {
    fn new(engine: ConversationEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            last_active: Instant::now(),
        }
    }

    /// Idle past the timeout and not in the middle of a turn.
    fn is_expired(&self, now: Instant, idle_timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_active) > idle_timeout
            && self.engine.try_lock().is_ok()
    }
}

/// Manages active conversation sessions.
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, Session>>,
    factory: Arc<dyn BackendFactory>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    limits: SessionLimits,
}

impl SessionManager {
    /// Creates a manager with no sessions and default limits.
    #[must_use]
    pub fn new(
        factory: Arc<dyn BackendFactory>,
        tools: Arc<ToolRegistry>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            factory,
            tools,
            system_prompt: system_prompt.into(),
            limits: SessionLimits::default(),
        }
    }

    /// Sets the session limits.
    #[must_use]
    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the session limits.
    #[must_use]
    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    /// Creates a session and returns its id.
    ///
    /// When the manager is full, expired sessions are evicted first.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Credential`] when no usable key is available
    /// and [`SessionError::Capacity`] when every slot is in use.
    #[instrument(skip(self, credentials))]
    pub async fn initialize(
        &self,
        credentials: &ProviderCredentials,
    ) -> Result<SessionId, Report<SessionError>> {
        let engine = self.build_engine(credentials)?;
        let id = SessionId::new();

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.limits.max_sessions {
            let evicted = evict_expired(&mut sessions, self.limits.idle_timeout);
            debug!(evicted, "session limit reached, evicted idle sessions");
        }
        if sessions.len() >= self.limits.max_sessions {
            warn!(max = self.limits.max_sessions, "session limit reached");
            return Err(SessionError::Capacity {
                max: self.limits.max_sessions,
            }
            .into());
        }
        sessions.insert(id, Session::new(engine));
        drop(sessions);

        info!(session_id = %id, "session initialized");
        Ok(id)
    }

    /// Replaces the engine behind `id`, discarding its history.
    ///
    /// Waits for any in-flight turn on the session to finish first.
    #[instrument(skip(self, credentials), fields(session_id = %id))]
    pub async fn reinitialize(
        &self,
        id: SessionId,
        credentials: &ProviderCredentials,
    ) -> Result<(), Report<SessionError>> {
        let session = self.touch(id).await?;
        let engine = self.build_engine(credentials)?;

        *session.lock().await = engine;

        info!("session reinitialized");
        Ok(())
    }

    /// Runs one turn on the session and returns the reply.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] for an unknown id and
    /// [`SessionError::Turn`] when the turn fails.
    #[instrument(skip(self, text), fields(session_id = %id))]
    pub async fn submit(&self, id: SessionId, text: &str) -> Result<String, Report<SessionError>> {
        let session = self.touch(id).await?;
        let mut engine = session.lock().await;

        let result = engine.submit(text).await.map_err(|report| {
            SessionError::Turn {
                id,
                cause: report.current_context().clone(),
            }
            .into()
        });
        drop(engine);

        // A long turn counts as activity up to its end.
        if let Some(entry) = self.sessions.write().await.get_mut(&id) {
            entry.last_active = Instant::now();
        }
        result
    }

    /// Clears the session's history back to the system message.
    pub async fn reset(&self, id: SessionId) -> Result<(), Report<SessionError>> {
        let session = self.touch(id).await?;
        session.lock().await.reset();
        info!(session_id = %id, "session reset");
        Ok(())
    }

    /// Removes the session.
    pub async fn end(&self, id: SessionId) -> Result<(), Report<SessionError>> {
        match self.sessions.write().await.remove(&id) {
            Some(_) => {
                info!(session_id = %id, "session ended");
                Ok(())
            }
            None => Err(SessionError::NotFound { id }.into()),
        }
    }

    /// Evicts every session idle past the timeout and returns how many were
    /// removed. Sessions with a turn in flight are kept.
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let evicted = evict_expired(&mut sessions, self.limits.idle_timeout);
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "evicted idle sessions");
        }
        evicted
    }

    /// Returns the number of history messages in the session.
    pub async fn history_len(&self, id: SessionId) -> Result<usize, Report<SessionError>> {
        let session = self.session(id).await?;
        let len = session.lock().await.history().len();
        Ok(len)
    }

    /// Returns the number of active sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns whether there are no active sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    async fn session(&self, id: SessionId) -> Result<SharedEngine, Report<SessionError>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(|entry| Arc::clone(&entry.engine))
            .ok_or_else(|| SessionError::NotFound { id }.into())
    }

    /// Looks up the session and marks it active.
    async fn touch(&self, id: SessionId) -> Result<SharedEngine, Report<SessionError>> {
        let mut sessions = self.sessions.write().await;
        let Some(entry) = sessions.get_mut(&id) else {
            return Err(SessionError::NotFound { id }.into());
        };
        entry.last_active = Instant::now();
        Ok(Arc::clone(&entry.engine))
    }

    fn build_engine(
        &self,
        credentials: &ProviderCredentials,
    ) -> Result<ConversationEngine, SessionError> {
        let backend = self.factory.create(credentials).map_err(|e| {
            warn!(error = %e, "failed to create provider backend");
            if e.is_credential() {
                SessionError::Credential {
                    reason: e.to_string(),
                }
            } else {
                SessionError::BackendUnavailable {
                    reason: e.to_string(),
                }
            }
        })?;

        Ok(ConversationEngine::new(
            backend,
            Arc::clone(&self.tools),
            self.system_prompt.clone(),
        ))
    }
}

fn evict_expired(sessions: &mut HashMap<SessionId, Session>, idle_timeout: Duration) -> usize {
    let now = Instant::now();
    let before = sessions.len();
    sessions.retain(|id, session| {
        let expired = session.is_expired(now, idle_timeout);
        if expired {
            debug!(session_id = %id, "evicting idle session");
        }
        !expired
    });
    before - sessions.len()
}
