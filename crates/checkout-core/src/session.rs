//! Session Management
//!
//! Maps bearer tokens to authenticated users. How the session was
//! established (OAuth, passkeys, ...) is not this crate's concern; the
//! checkout flow only needs "who is calling, if anyone".

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CheckoutCoreError, Result};
use crate::order::UserId;

/// Opaque bearer token
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log the full token
        let shown: String = self.0.chars().take(6).collect();
        write!(f, "{shown}…")
    }
}

/// An authenticated session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub token: SessionToken,

    pub user_id: UserId,

    pub created_at: DateTime<Utc>,

    /// `None` = valid until revoked
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a new session with a fresh token
    pub fn new(user_id: UserId) -> Self {
        Self::with_token(SessionToken::generate(), user_id)
    }

    /// Create with a specific token
    pub fn with_token(token: SessionToken, user_id: UserId) -> Self {
        Self {
            token,
            user_id,
            created_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Set an expiry
    #[must_use]
    pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }
}

/// Session store trait for persistence
pub trait SessionStore: Send + Sync {
    /// Save a session
    fn save(&self, session: &Session) -> Result<()>;

    /// Resolve a token to a live (unexpired) session
    fn resolve(&self, token: &SessionToken) -> Result<Option<Session>>;

    /// Revoke a session
    fn revoke(&self, token: &SessionToken) -> Result<()>;
}

/// In-memory session store (for development/testing)
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionToken, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with `(token, user)` pairs
    pub fn with_tokens<I, T, U>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (T, U)>,
        T: Into<String>,
        U: Into<String>,
    {
        let sessions = pairs
            .into_iter()
            .map(|(token, user)| {
                let session = Session::with_token(SessionToken::from_string(token), UserId::new(user));
                (session.token.clone(), session)
            })
            .collect();
        Self {
            sessions: RwLock::new(sessions),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<E>(_: E) -> CheckoutCoreError {
    CheckoutCoreError::Session("session store lock poisoned".into())
}

impl SessionStore for MemorySessionStore {
    fn save(&self, session: &Session) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.insert(session.token.clone(), session.clone());
        Ok(())
    }

    fn resolve(&self, token: &SessionToken) -> Result<Option<Session>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        match sessions.get(token) {
            Some(session) if session.is_expired() => {
                tracing::debug!(user_id = %session.user_id, "Session expired");
                Ok(None)
            }
            other => Ok(other.cloned()),
        }
    }

    fn revoke(&self, token: &SessionToken) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        let session = Session::new(UserId::new("u1"));
        let token = session.token.clone();

        store.save(&session).unwrap();

        let loaded = store.resolve(&token).unwrap();
        assert_eq!(loaded.unwrap().user_id, UserId::new("u1"));

        store.revoke(&token).unwrap();
        assert!(store.resolve(&token).unwrap().is_none());
    }

    #[test]
    fn test_expired_session_does_not_resolve() {
        let store = MemorySessionStore::new();
        let session = Session::new(UserId::new("u1")).expiring_at(Utc::now() - Duration::minutes(1));
        store.save(&session).unwrap();

        assert!(store.resolve(&session.token).unwrap().is_none());
    }

    #[test]
    fn test_seeded_tokens() {
        let store = MemorySessionStore::with_tokens([("tok-a", "alice"), ("tok-b", "bob")]);
        assert_eq!(store.len(), 2);

        let bob = store.resolve(&SessionToken::from_string("tok-b")).unwrap().unwrap();
        assert_eq!(bob.user_id.as_str(), "bob");
    }

    #[test]
    fn test_token_display_is_redacted() {
        let token = SessionToken::from_string("abcdef123456");
        assert_eq!(token.to_string(), "abcdef…");
    }
}
