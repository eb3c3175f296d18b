//! Authentication session shared by the REST client and the views.
//!
//! [`SessionContext`] replaces an ambient global auth store: it is created
//! once, wrapped in an `Arc`, and handed to everything that needs the bearer
//! token. A 401 from any REST call ends up in
//! [`SessionContext::handle_unauthorized`], which clears the session and
//! runs the injected callback (typically "navigate to login").

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::domain::AuthUser;
use crate::error::ClientError;

/// Callback run after the session is cleared by a 401.
pub type UnauthorizedHook = Box<dyn Fn() + Send + Sync>;

/// The persisted part of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Bearer token.
    pub token: Option<String>,
    /// Profile of the logged-in user.
    pub user: Option<AuthUser>,
}

/// Shared authentication state.
pub struct SessionContext {
    state: RwLock<StoredSession>,
    on_unauthorized: RwLock<Option<UnauthorizedHook>>,
    file: Option<PathBuf>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("SessionContext")
            .field("authenticated", &state.token.is_some())
            .field("user", &state.user.as_ref().map(|u| u.username.as_str()))
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// Creates an empty, in-memory session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoredSession::default()),
            on_unauthorized: RwLock::new(None),
            file: None,
        }
    }

    /// Creates a session backed by a JSON file, restoring it if the file
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the file exists but cannot be read, or
    /// [`ClientError::Json`] if it is not a valid session.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref().to_path_buf();
        let stored = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => StoredSession::default(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoredSession::default(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!(path = %path.display(), restored = stored.token.is_some(), "session loaded");
        Ok(Self {
            state: RwLock::new(stored),
            on_unauthorized: RwLock::new(None),
            file: Some(path),
        })
    }

    /// Installs the callback run after a 401 clears the session.
    pub fn set_on_unauthorized(&self, hook: UnauthorizedHook) {
        *self
            .on_unauthorized
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(hook);
    }

    /// Returns the bearer token, if logged in.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    /// Returns the logged-in user's profile.
    #[must_use]
    pub fn user(&self) -> Option<AuthUser> {
        self.read().user.clone()
    }

    /// Returns `true` if a token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().token.is_some()
    }

    /// Records a successful login and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the session file cannot be written.
    pub fn login(&self, user: AuthUser, token: String) -> Result<(), ClientError> {
        let snapshot = {
            let mut state = self.write();
            state.user = Some(user);
            state.token = Some(token);
            state.clone()
        };
        self.persist(&snapshot)
    }

    /// Replaces the stored profile, keeping the token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the session file cannot be written.
    pub fn set_profile(&self, user: AuthUser) -> Result<(), ClientError> {
        let snapshot = {
            let mut state = self.write();
            state.user = Some(user);
            state.clone()
        };
        self.persist(&snapshot)
    }

    /// Clears the session and its persisted copy.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Io`] if the session file cannot be written.
    pub fn logout(&self) -> Result<(), ClientError> {
        *self.write() = StoredSession::default();
        self.persist(&StoredSession::default())
    }

    /// Ends the session after the server rejected the token.
    ///
    /// Unconditional: the in-memory session is always cleared and the
    /// callback always runs, even if the persisted copy cannot be updated.
    pub fn handle_unauthorized(&self) {
        tracing::warn!("session rejected by server, logging out");
        if let Err(e) = self.logout() {
            tracing::warn!(error = %e, "failed to clear persisted session");
        }
        let hook = self.on_unauthorized.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(hook) = hook.as_ref() {
            hook();
        }
    }

    fn persist(&self, stored: &StoredSession) -> Result<(), ClientError> {
        let Some(path) = &self.file else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(stored)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, StoredSession> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StoredSession> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn user() -> AuthUser {
        AuthUser {
            id: UserId::new(),
            username: "marta".to_string(),
            first_name: "Marta".to_string(),
            last_name: "Ruiz".to_string(),
        }
    }

    #[test]
    fn login_then_logout() {
        let session = SessionContext::new();
        assert!(!session.is_authenticated());
        let Ok(()) = session.login(user(), "tok".to_string()) else {
            panic!("login failed");
        };
        assert_eq!(session.token().as_deref(), Some("tok"));
        let Ok(()) = session.logout() else {
            panic!("logout failed");
        };
        assert!(session.user().is_none());
    }

    #[test]
    fn unauthorized_clears_and_calls_hook() {
        let session = SessionContext::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        session.set_on_unauthorized(Box::new(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        let Ok(()) = session.login(user(), "tok".to_string()) else {
            panic!("login failed");
        };

        session.handle_unauthorized();
        assert!(!session.is_authenticated());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Already logged out: still unconditional.
        session.handle_unauthorized();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn persists_across_instances() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let path = dir.path().join("session.json");

        let Ok(first) = SessionContext::load(&path) else {
            panic!("missing file should load empty");
        };
        assert!(!first.is_authenticated());
        let u = user();
        let Ok(()) = first.login(u.clone(), "abc".to_string()) else {
            panic!("login failed");
        };

        let Ok(second) = SessionContext::load(&path) else {
            panic!("saved file should load");
        };
        assert_eq!(second.token().as_deref(), Some("abc"));
        assert_eq!(second.user(), Some(u));

        let Ok(()) = second.logout() else {
            panic!("logout failed");
        };
        let Ok(third) = SessionContext::load(&path) else {
            panic!("cleared file should load");
        };
        assert!(!third.is_authenticated());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let path = dir.path().join("session.json");
        let Ok(()) = fs::write(&path, "{not json") else {
            panic!("write failed");
        };
        assert!(matches!(SessionContext::load(&path), Err(ClientError::Json(_))));
    }
}
