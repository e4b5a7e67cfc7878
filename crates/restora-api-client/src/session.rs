//! Session guard: the single authoritative notion of "who is logged in".
//!
//! The persisted token lives behind [`TokenStore`] (a file on disk for the
//! CLI, memory for tests). [`SessionHandle`] pairs that store with the
//! decoded [`Session`] under one lock, so token and session can never
//! diverge: both are written together on install and cleared together on
//! logout, decode failure, or authorization rejection.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use validator::Validate;

use restora_core::routes::{self, Route, RouteDecision};
use restora_core::token::decode_session;
use restora_core::{ClientError, LoginRequest, RegisterRequest, Session};

use crate::ApiClient;

/// Persistence for the one process-wide token string.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, ClientError>;
    fn save(&self, token: &str) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

/// Token persisted as a single file, the CLI analog of the browser's
/// local storage slot.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_string()))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore(Mutex<Option<String>>);

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        Ok(self.0.lock().unwrap().clone())
    }

    fn save(&self, token: &str) -> Result<(), ClientError> {
        *self.0.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.0.lock().unwrap() = None;
        Ok(())
    }
}

#[derive(Default)]
struct SessionState {
    token: Option<String>,
    session: Option<Session>,
    ready: bool,
}

struct SessionInner {
    store: Box<dyn TokenStore>,
    state: RwLock<SessionState>,
}

/// Shared token + session cell. Cloned into the API client (which reads the
/// token and reacts to rejections) and the session guard (which drives the
/// lifecycle).
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read().unwrap();
        f.debug_struct("SessionHandle")
            .field("authenticated", &state.session.is_some())
            .field("ready", &state.ready)
            .finish()
    }
}

impl SessionHandle {
    pub fn new(store: Box<dyn TokenStore>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                store,
                state: RwLock::new(SessionState::default()),
            }),
        }
    }

    /// Startup pass over the persisted token. A token that fails to decode
    /// is cleared and forgotten (local recovery, not an error); an
    /// unreadable store is treated as "no token".
    pub fn initialize(&self) -> Option<Session> {
        let loaded = self.inner.store.load();
        let mut state = self.inner.state.write().unwrap();
        state.ready = true;

        match loaded {
            Ok(Some(token)) => match decode_session(&token) {
                Ok(session) => {
                    state.token = Some(token);
                    state.session = Some(session.clone());
                    Some(session)
                }
                Err(e) => {
                    tracing::debug!("Persisted token rejected, clearing: {}", e);
                    if let Err(e) = self.inner.store.clear() {
                        tracing::warn!("Failed to clear rejected token: {}", e);
                    }
                    state.token = None;
                    state.session = None;
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Could not read persisted token: {}", e);
                None
            }
        }
    }

    /// True once the startup pass has completed (successfully or not);
    /// protected surfaces wait on this before rendering.
    pub fn is_ready(&self) -> bool {
        self.inner.state.read().unwrap().ready
    }

    /// Persist a freshly issued token and swap in its session atomically.
    /// On any failure the previous state is left untouched.
    pub fn install(&self, token: &str) -> Result<Session, ClientError> {
        let session = decode_session(token)?;
        self.inner.store.save(token)?;

        let mut state = self.inner.state.write().unwrap();
        state.token = Some(token.to_string());
        state.session = Some(session.clone());
        state.ready = true;
        Ok(session)
    }

    /// Drop the session and the persisted token. Store failures are logged,
    /// not propagated: the in-memory session is gone either way.
    pub fn clear(&self) {
        if let Err(e) = self.inner.store.clear() {
            tracing::warn!("Failed to clear persisted token: {}", e);
        }
        let mut state = self.inner.state.write().unwrap();
        state.token = None;
        state.session = None;
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.state.read().unwrap().session.clone()
    }

    pub fn bearer_token(&self) -> Option<String> {
        self.inner.state.read().unwrap().token.clone()
    }
}

/// Lifecycle operations over a [`SessionHandle`], plus the route-access
/// decision the navigation layer consults.
pub struct SessionGuard {
    client: Arc<ApiClient>,
    sessions: SessionHandle,
}

impl SessionGuard {
    pub fn new(client: Arc<ApiClient>, sessions: SessionHandle) -> Self {
        Self { client, sessions }
    }

    /// Must run before any protected surface renders.
    pub fn initialize(&self) -> Option<Session> {
        self.sessions.initialize()
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<Session, ClientError> {
        request.validate()?;
        let token = self.client.login(request).await?;
        self.sessions.install(&token)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<Session, ClientError> {
        request.validate()?;
        let token = self.client.register(request).await?;
        self.sessions.install(&token)
    }

    /// Synchronous; no network call is involved.
    pub fn logout(&self) {
        self.sessions.clear();
    }

    pub fn current_session(&self) -> Option<Session> {
        self.sessions.current()
    }

    pub fn is_ready(&self) -> bool {
        self.sessions.is_ready()
    }

    /// Route-access predicate, judged against wall-clock time now.
    pub fn resolve_route(&self, route: Route) -> RouteDecision {
        routes::resolve(route, self.current_session().as_ref(), Utc::now())
    }
}
