//! In-memory session store.
//!
//! Owns the token → session map and every rule about session validity:
//!
//! - absolute expiry: a session never outlives `created_at + session_lifetime`
//! - inactivity expiry: a session dies once it has gone unvalidated for longer
//!   than `inactivity_timeout`
//! - both are terminal; the entry is removed the moment either is observed
//!
//! All operations take one `tokio::sync::Mutex` over the whole map, so each is
//! atomic with respect to every other operation on any token. `rotate` keeps
//! the lock across check, removal of the old token and insertion of the new
//! one; no caller can see both tokens live, or neither.
//!
//! The store performs no I/O. Identity resolution happens before `issue` is
//! called and never under this lock.
//!
//! ## Example
//!
//! ```
//! use core_auth::{Identity, SessionStore};
//! use core_runtime::config::SessionConfig;
//!
//! # #[tokio::main]
//! # async fn main() -> core_auth::Result<()> {
//! let store = SessionStore::with_system_clock(&SessionConfig::default())?;
//!
//! let identity = Identity::new("google", "google_user_123", "user@google.com", "Google User");
//! let token = store.issue(identity.clone()).await?;
//!
//! assert_eq!(store.validate(token.as_str()).await?, identity);
//!
//! let rotated = store.rotate(token.as_str()).await?;
//! assert!(store.validate(token.as_str()).await.is_err());
//! assert!(store.invalidate(rotated.as_str()).await);
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::token::{fingerprint, SessionToken};
use crate::types::{ExpiryReason, Identity, Session};
use bridge_traits::time::{Clock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use core_runtime::config::SessionConfig;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

type SessionMap = HashMap<SessionToken, Session>;

/// Token → session map with lifetime and inactivity enforcement.
pub struct SessionStore {
    sessions: Mutex<SessionMap>,
    clock: Arc<dyn Clock>,
    session_lifetime: Duration,
    inactivity_timeout: Duration,
}

impl SessionStore {
    /// Create an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if `config` does not validate or its
    /// durations cannot be represented as timestamps offsets.
    pub fn new(config: &SessionConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let session_lifetime = to_chrono(config.session_lifetime, "session_lifetime")?;
        let inactivity_timeout = to_chrono(config.inactivity_timeout, "inactivity_timeout")?;

        debug!(
            session_lifetime_secs = session_lifetime.num_seconds(),
            inactivity_timeout_secs = inactivity_timeout.num_seconds(),
            "Initializing SessionStore"
        );

        Ok(Self {
            sessions: Mutex::new(HashMap::new()),
            clock,
            session_lifetime,
            inactivity_timeout,
        })
    }

    /// Create a store reading the real system time.
    pub fn with_system_clock(config: &SessionConfig) -> Result<Self> {
        Self::new(config, Arc::new(SystemClock))
    }

    pub fn session_lifetime(&self) -> Duration {
        self.session_lifetime
    }

    pub fn inactivity_timeout(&self) -> Duration {
        self.inactivity_timeout
    }

    /// Start a session for `identity` and return its token.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidIdentity`] if the identity id is empty.
    pub async fn issue(&self, identity: Identity) -> Result<SessionToken> {
        check_identity(&identity)?;

        let mut sessions = self.sessions.lock().await;
        let now = self.clock.now();
        let token = fresh_token(&sessions);
        let user_id = identity.id.clone();

        let session = Session::new(token.clone(), identity, now, self.session_lifetime);
        let expires_at = session.expires_at;
        sessions.insert(token.clone(), session);

        info!(
            user_id = %user_id,
            token_fingerprint = %token.fingerprint(),
            expires_at = %expires_at,
            "Session issued"
        );

        Ok(token)
    }

    /// Look up `token`, enforce both deadlines and record activity.
    ///
    /// Unknown and malformed tokens are indistinguishable: both fail
    /// [`AuthError::NotFound`].
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotFound`] if no session exists for the token
    /// - [`AuthError::Expired`] if the session was past a deadline; it has
    ///   been removed and later calls report `NotFound`
    pub async fn validate(&self, token: &str) -> Result<Identity> {
        let mut sessions = self.sessions.lock().await;
        let now = self.clock.now();
        let session = self.live_session(&mut sessions, token, now)?;
        session.touch(now);

        debug!(
            user_id = %session.identity.id,
            token_fingerprint = %fingerprint(token),
            "Session validated"
        );

        Ok(session.identity.clone())
    }

    /// Remove the session for `token`. Returns whether one existed.
    ///
    /// Idempotent: a second call for the same token returns `false`.
    pub async fn invalidate(&self, token: &str) -> bool {
        self.remove(token).await.is_some()
    }

    /// Remove and return the session for `token`, expired or not.
    pub async fn remove(&self, token: &str) -> Option<Session> {
        self.remove_checked(token).await.map(|(session, _)| session)
    }

    /// [`remove`](Self::remove), also reporting whether the session was
    /// already past a deadline when it was taken out.
    pub(crate) async fn remove_checked(
        &self,
        token: &str,
    ) -> Option<(Session, Option<ExpiryReason>)> {
        let mut sessions = self.sessions.lock().await;
        let now = self.clock.now();

        let Some(session) = sessions.remove(token) else {
            debug!(
                token_fingerprint = %fingerprint(token),
                "Invalidate for unknown session"
            );
            return None;
        };

        let expiry = session.expiry_at(now, self.inactivity_timeout);
        match expiry {
            Some(reason) => info!(
                user_id = %session.identity.id,
                token_fingerprint = %fingerprint(token),
                reason = %reason,
                "Expired session invalidated"
            ),
            None => info!(
                user_id = %session.identity.id,
                token_fingerprint = %fingerprint(token),
                "Session invalidated"
            ),
        }

        Some((session, expiry))
    }

    /// Replace `token` with a fresh one for the same identity.
    ///
    /// The old token is checked with the same rules as [`validate`](Self::validate).
    /// On success it is removed and a new session with reset timestamps is
    /// inserted, all under a single lock acquisition.
    ///
    /// # Errors
    ///
    /// Same as [`validate`](Self::validate); on error no new session exists.
    pub async fn rotate(&self, token: &str) -> Result<SessionToken> {
        self.rotate_session(token).await.map(|(new_token, _)| new_token)
    }

    /// [`rotate`](Self::rotate), also handing back the identity carried over.
    pub(crate) async fn rotate_session(&self, token: &str) -> Result<(SessionToken, Identity)> {
        let mut sessions = self.sessions.lock().await;
        let now = self.clock.now();

        let identity = self
            .live_session(&mut sessions, token, now)?
            .identity
            .clone();
        sessions.remove(token);

        let new_token = fresh_token(&sessions);
        let session = Session::new(new_token.clone(), identity.clone(), now, self.session_lifetime);
        sessions.insert(new_token.clone(), session);

        info!(
            user_id = %identity.id,
            old_token_fingerprint = %fingerprint(token),
            token_fingerprint = %new_token.fingerprint(),
            "Session rotated"
        );

        Ok((new_token, identity))
    }

    /// Remove every session past either deadline. Returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let now = self.clock.now();
        let before = sessions.len();

        sessions.retain(|_, session| session.is_valid_at(now, self.inactivity_timeout));

        let purged = before - sessions.len();
        if purged > 0 {
            info!(purged, remaining = sessions.len(), "Purged expired sessions");
        }
        purged
    }

    /// Number of entries held, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Find the live session for `token`, removing it if it has expired.
    fn live_session<'a>(
        &self,
        sessions: &'a mut SessionMap,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<&'a mut Session> {
        let expiry = match sessions.get(token) {
            None => {
                debug!(token_fingerprint = %fingerprint(token), "Session not found");
                return Err(AuthError::NotFound);
            }
            Some(session) => session.expiry_at(now, self.inactivity_timeout),
        };

        if let Some(reason) = expiry {
            if let Some(session) = sessions.remove(token) {
                info!(
                    user_id = %session.identity.id,
                    token_fingerprint = %fingerprint(token),
                    reason = %reason,
                    "Session expired"
                );
            }
            return Err(AuthError::Expired { reason });
        }

        sessions.get_mut(token).ok_or(AuthError::NotFound)
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("session_lifetime", &self.session_lifetime)
            .field("inactivity_timeout", &self.inactivity_timeout)
            .finish_non_exhaustive()
    }
}

fn check_identity(identity: &Identity) -> Result<()> {
    if identity.id.trim().is_empty() {
        warn!(provider = %identity.provider, "Refusing to issue session for empty identity id");
        return Err(AuthError::InvalidIdentity {
            reason: "identity id is empty".to_string(),
        });
    }
    Ok(())
}

/// Draw tokens until one is not already a key. With 256 bits of entropy the
/// loop body runs once in practice.
fn fresh_token(sessions: &SessionMap) -> SessionToken {
    loop {
        let candidate = SessionToken::generate();
        if !sessions.contains_key(candidate.as_str()) {
            return candidate;
        }
        warn!("Session token collision, drawing a new token");
    }
}

fn to_chrono(duration: std::time::Duration, name: &str) -> Result<Duration> {
    Duration::from_std(duration)
        .map_err(|_| AuthError::Config(format!("{} is out of range", name)))
}
