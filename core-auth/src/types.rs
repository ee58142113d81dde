use crate::token::SessionToken;
use chrono::{DateTime, Duration, Utc};
use core_runtime::logging::redact_if_sensitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A verified user identity produced by an [`IdentityResolver`](crate::IdentityResolver).
///
/// Immutable once resolved. The session store keeps its own copy by value.
///
/// # Examples
///
/// ```
/// use core_auth::Identity;
///
/// let identity = Identity::new("github", "github_user_123", "user@github.com", "Github User");
/// assert_eq!(identity.provider, "github");
/// assert!(!format!("{:?}", identity).contains("user@github.com"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider-scoped user id, unique per provider
    pub id: String,
    /// Provider the identity was resolved through
    pub provider: String,
    pub email: String,
    pub display_name: String,
    /// Set once, at first resolution
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Create an identity stamped with the current time.
    pub fn new(
        provider: impl Into<String>,
        id: impl Into<String>,
        email: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            email: email.into(),
            display_name: display_name.into(),
            created_at: Utc::now(),
        }
    }

    /// Override the resolution timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

// E-mail addresses are PII; keep them out of debug output and logs.
impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("provider", &self.provider)
            .field("email", &redact_if_sensitive("email", &self.email))
            .field("display_name", &self.display_name)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Why a session stopped being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpiryReason {
    /// Past `expires_at`, regardless of activity
    Absolute,
    /// Idle for longer than the inactivity timeout
    Inactivity,
}

impl ExpiryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpiryReason::Absolute => "absolute",
            ExpiryReason::Inactivity => "inactivity",
        }
    }
}

impl fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One active login.
///
/// # Lifecycle
///
/// ```text
/// issue ──> Active ──validate (within limits)──> Active
///             │
///             ├──validate (past a deadline)──> Expired (removed)
///             └──invalidate / rotate─────────> Removed
/// ```
///
/// `expires_at` is fixed at creation; only `last_activity_at` ever moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: SessionToken,
    pub identity: Identity,
    pub created_at: DateTime<Utc>,
    /// Absolute deadline: `created_at + session_lifetime`
    pub expires_at: DateTime<Utc>,
    /// Refreshed by each successful validation
    pub last_activity_at: DateTime<Utc>,
}

impl Session {
    /// Start a session at `now`.
    pub fn new(
        token: SessionToken,
        identity: Identity,
        now: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        Self {
            token,
            identity,
            created_at: now,
            expires_at: now + lifetime,
            last_activity_at: now,
        }
    }

    /// Returns the reason this session is no longer valid at `now`, if any.
    ///
    /// A session is valid iff `now <= expires_at` and
    /// `now - last_activity_at <= inactivity_timeout`. The absolute deadline is
    /// checked first.
    pub fn expiry_at(&self, now: DateTime<Utc>, inactivity_timeout: Duration) -> Option<ExpiryReason> {
        if now > self.expires_at {
            Some(ExpiryReason::Absolute)
        } else if now - self.last_activity_at > inactivity_timeout {
            Some(ExpiryReason::Inactivity)
        } else {
            None
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>, inactivity_timeout: Duration) -> bool {
        self.expiry_at(now, inactivity_timeout).is_none()
    }

    /// Record activity. Never moves `expires_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }
}
