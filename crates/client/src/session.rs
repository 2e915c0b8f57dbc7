//! Session state and persistence.
//!
//! Exactly one session is live per process. The store has explicit init
//! (login) and teardown (logout) transitions:
//!
//! ```text
//! anonymous -> authenticating -> authenticated
//! authenticated -> anonymous      (logout or rejected token)
//! authenticating -> anonymous     (failed login)
//! ```
//!
//! The session survives a restart via a JSON file restored at startup,
//! before any route guard evaluates.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use parcelflow_core::{Role, User};

use crate::error::AuthError;

/// The authenticated identity and credentials for the current process.
#[derive(Clone)]
pub struct Session {
    user: User,
    access_token: SecretString,
    refresh_token: Option<SecretString>,
}

impl Session {
    #[must_use]
    pub fn new(user: User, access_token: SecretString, refresh_token: Option<SecretString>) -> Self {
        Self {
            user,
            access_token,
            refresh_token,
        }
    }

    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.user.role
    }

    #[must_use]
    pub const fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    #[must_use]
    pub const fn refresh_token(&self) -> Option<&SecretString> {
        self.refresh_token.as_ref()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user.email)
            .field("role", &self.user.role)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Session gate state machine.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated(Session),
}

impl SessionState {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Disk representation of a session. Tokens are stored in the clear, which
/// matches the browser-storage persistence this replaces; the file lives in
/// the user's own profile directory.
#[derive(Serialize, Deserialize)]
struct PersistedSession {
    user: User,
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

struct SessionStoreInner {
    state: RwLock<SessionState>,
    changed: watch::Sender<u64>,
    file: Option<PathBuf>,
}

/// Process-wide session store.
///
/// Cheap to clone; all clones share state. Guards subscribe via
/// [`SessionStore::subscribe`] so role checks re-evaluate on every
/// transition, not just at mount time.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(file: Option<PathBuf>) -> Self {
        let (changed, _) = watch::channel(0);
        Self {
            inner: Arc::new(SessionStoreInner {
                state: RwLock::new(SessionState::Anonymous),
                changed,
                file,
            }),
        }
    }

    /// Restore a persisted session from disk, if one exists.
    ///
    /// Returns `true` when a session was restored. Must run before any
    /// protected route evaluates its guard.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the file exists but cannot be read or
    /// parsed. A missing file is not an error.
    pub fn restore(&self) -> Result<bool, AuthError> {
        let Some(path) = &self.inner.file else {
            return Ok(false);
        };
        if !path.exists() {
            return Ok(false);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| AuthError::Storage(format!("read {}: {e}", path.display())))?;
        let persisted: PersistedSession = serde_json::from_str(&raw)
            .map_err(|e| AuthError::Storage(format!("parse {}: {e}", path.display())))?;

        let session = Session::new(
            persisted.user,
            SecretString::from(persisted.access_token),
            persisted.refresh_token.map(SecretString::from),
        );
        debug!(email = %session.user().email, "restored persisted session");
        self.transition(SessionState::Authenticated(session));
        Ok(true)
    }

    /// Enter the `authenticating` state. Called when a login begins.
    pub fn begin_login(&self) {
        self.transition(SessionState::Authenticating);
    }

    /// Complete a login (credential or OAuth callback - both populate the
    /// session identically) and persist it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if persistence is enabled and the file
    /// cannot be written. The in-memory session is installed regardless.
    pub fn complete_login(&self, session: Session) -> Result<(), AuthError> {
        let persist_result = self.persist(&session);
        self.transition(SessionState::Authenticated(session));
        persist_result
    }

    /// Abort a failed login attempt.
    pub fn fail_login(&self) {
        self.transition(SessionState::Anonymous);
    }

    /// Tear down the session and remove the persisted copy.
    pub fn logout(&self) {
        if let Some(path) = &self.inner.file
            && path.exists()
            && let Err(e) = std::fs::remove_file(path)
        {
            warn!(path = %path.display(), error = %e, "failed to remove session file");
        }
        self.transition(SessionState::Anonymous);
    }

    /// Snapshot of the current state.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned, which requires a prior panic
    /// while holding it.
    #[must_use]
    pub fn current(&self) -> SessionState {
        #[allow(clippy::expect_used)]
        self.inner
            .state
            .read()
            .expect("session lock poisoned")
            .clone()
    }

    /// The authenticated user, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        match self.current() {
            SessionState::Authenticated(session) => Some(session.user().clone()),
            _ => None,
        }
    }

    /// The bearer token to attach to requests, if authenticated.
    #[must_use]
    pub fn bearer(&self) -> Option<SecretString> {
        match self.current() {
            SessionState::Authenticated(session) => Some(session.access_token().clone()),
            _ => None,
        }
    }

    /// Receiver that observes a version bump on every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changed.subscribe()
    }

    fn transition(&self, next: SessionState) {
        {
            #[allow(clippy::expect_used)]
            let mut state = self.inner.state.write().expect("session lock poisoned");
            *state = next;
        }
        self.inner.changed.send_modify(|version| *version += 1);
    }

    fn persist(&self, session: &Session) -> Result<(), AuthError> {
        let Some(path) = &self.inner.file else {
            return Ok(());
        };
        let persisted = PersistedSession {
            user: session.user().clone(),
            access_token: session.access_token().expose_secret().to_string(),
            refresh_token: session
                .refresh_token()
                .map(|t| t.expose_secret().to_string()),
        };
        let raw = serde_json::to_string_pretty(&persisted)
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        std::fs::write(path, raw)
            .map_err(|e| AuthError::Storage(format!("write {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user(role: Role) -> User {
        User {
            id: "u1".to_string(),
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            role,
            is_active: true,
            address: None,
            created_at: Utc::now(),
        }
    }

    fn sample_session() -> Session {
        Session::new(
            sample_user(Role::Customer),
            SecretString::from("token-123"),
            Some(SecretString::from("refresh-456")),
        )
    }

    #[test]
    fn test_state_machine_transitions() {
        let store = SessionStore::new(None);
        assert!(matches!(store.current(), SessionState::Anonymous));

        store.begin_login();
        assert!(matches!(store.current(), SessionState::Authenticating));

        store.complete_login(sample_session()).expect("login");
        assert!(store.current().is_authenticated());

        store.logout();
        assert!(matches!(store.current(), SessionState::Anonymous));
    }

    #[test]
    fn test_failed_login_returns_to_anonymous() {
        let store = SessionStore::new(None);
        store.begin_login();
        store.fail_login();
        assert!(matches!(store.current(), SessionState::Anonymous));
        assert!(store.bearer().is_none());
    }

    #[test]
    fn test_bearer_exposed_only_when_authenticated() {
        let store = SessionStore::new(None);
        assert!(store.bearer().is_none());
        store.complete_login(sample_session()).expect("login");
        let bearer = store.bearer().expect("bearer");
        assert_eq!(bearer.expose_secret(), "token-123");
    }

    #[test]
    fn test_subscribe_observes_transitions() {
        let store = SessionStore::new(None);
        let rx = store.subscribe();
        let before = *rx.borrow();
        store.begin_login();
        store.complete_login(sample_session()).expect("login");
        assert!(*rx.borrow() > before);
    }

    #[test]
    fn test_persist_and_restore_round_trip() {
        let dir = std::env::temp_dir().join(format!("parcelflow-session-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("mkdir");
        let path = dir.join("session.json");

        let store = SessionStore::new(Some(path.clone()));
        store.complete_login(sample_session()).expect("login");

        let restored = SessionStore::new(Some(path.clone()));
        assert!(restored.restore().expect("restore"));
        let user = restored.user().expect("user");
        assert_eq!(user.email, "jane@example.com");

        restored.logout();
        assert!(!path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_restore_without_file_is_noop() {
        let store = SessionStore::new(Some(PathBuf::from("/nonexistent/session.json")));
        assert!(!store.restore().expect("restore"));
        assert!(matches!(store.current(), SessionState::Anonymous));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let session = sample_session();
        let debug = format!("{session:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("token-123"));
    }
}
