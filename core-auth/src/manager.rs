//! # Authentication Manager
//!
//! Orchestrates login and session lifecycle for a request-handling layer.
//!
//! ## Overview
//!
//! `AuthManager` combines an [`IdentityResolver`] with a [`SessionStore`]:
//!
//! - `login` checks the provider against the allow-list and the code's shape
//!   before any I/O, resolves the identity under a timeout (outside every
//!   store lock), then issues a session
//! - `validate`, `logout` and `rotate` delegate to the store
//! - every outcome is published on the [`EventBus`]
//!
//! How results map onto transport status codes is the caller's business;
//! [`AuthError::is_session_error`] and [`AuthError::is_recoverable`] help.
//!
//! ## Usage
//!
//! ```
//! use core_auth::{AuthManager, IdentityProfile, StaticIdentityResolver};
//! use core_runtime::config::SessionConfig;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> core_auth::Result<()> {
//! let config = SessionConfig::default();
//! let resolver = StaticIdentityResolver::new(&config.allowed_providers)
//!     .with_identity("google", "code-1", IdentityProfile::new("google_user_123", "user@google.com", "Google User"));
//!
//! let manager = AuthManager::with_defaults(config, Arc::new(resolver))?;
//!
//! let token = manager.login("google", "code-1").await?;
//! let identity = manager.validate(token.as_str()).await?;
//! assert_eq!(identity.id, "google_user_123");
//!
//! assert!(manager.logout(token.as_str()).await);
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::resolver::{validate_auth_code, IdentityResolver};
use crate::store::SessionStore;
use crate::token::{fingerprint, SessionToken};
use crate::types::Identity;
use bridge_traits::time::{Clock, SystemClock};
use core_runtime::config::{normalize_provider, SessionConfig};
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{timeout, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

/// Shortest sweep period accepted by [`AuthManager::spawn_session_sweeper`]
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// Login and session lifecycle orchestrator.
pub struct AuthManager {
    store: Arc<SessionStore>,
    resolver: Arc<dyn IdentityResolver>,
    config: SessionConfig,
    event_bus: EventBus,
}

impl AuthManager {
    /// Creates a manager from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if `config` is invalid.
    pub fn new(
        config: SessionConfig,
        resolver: Arc<dyn IdentityResolver>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
    ) -> Result<Self> {
        let store = SessionStore::new(&config, clock)?;

        info!(
            providers = ?config.allowed_providers,
            "AuthManager initialized"
        );

        Ok(Self {
            store: Arc::new(store),
            resolver,
            config,
            event_bus,
        })
    }

    /// Creates a manager on the system clock with a fresh event bus sized by
    /// `config.event_buffer_size`.
    pub fn with_defaults(config: SessionConfig, resolver: Arc<dyn IdentityResolver>) -> Result<Self> {
        config.validate()?;
        let event_bus = EventBus::new(config.event_buffer_size);
        Self::new(config, resolver, Arc::new(SystemClock), event_bus)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolve `(provider, auth_code)` and start a session.
    ///
    /// # Errors
    ///
    /// - [`AuthError::UnsupportedProvider`] if the provider is not allowed
    /// - [`AuthError::InvalidCode`] if the code is malformed or rejected
    /// - [`AuthError::ProviderUnavailable`] on resolver failure or timeout
    /// - [`AuthError::InvalidIdentity`] if the resolver returned an unusable identity
    #[instrument(skip(self, auth_code))]
    pub async fn login(&self, provider: &str, auth_code: &str) -> Result<SessionToken> {
        let provider = normalize_provider(provider);

        if !self.config.is_provider_allowed(&provider) {
            warn!("Login attempted with unsupported provider");
            return Err(self.login_failed(AuthError::UnsupportedProvider(provider)));
        }

        if let Err(err) = validate_auth_code(auth_code) {
            warn!("Login attempted with malformed authorization code");
            return Err(self.login_failed(err));
        }

        self.emit(AuthEvent::SigningIn {
            provider: provider.clone(),
        });

        let identity = self.resolve_identity(&provider, auth_code).await?;

        let token = self
            .store
            .issue(identity.clone())
            .await
            .map_err(|err| self.login_failed(err))?;

        self.emit(AuthEvent::SignedIn {
            user_id: identity.id.clone(),
            provider,
        });

        info!(user_id = %identity.id, "Login completed");
        Ok(token)
    }

    /// Calls the resolver under `resolve_timeout`, with no store lock held.
    /// Errors outside the resolver contract are reported as
    /// `ProviderUnavailable`.
    async fn resolve_identity(&self, provider: &str, auth_code: &str) -> Result<Identity> {
        debug!("Resolving identity");

        let outcome = timeout(
            self.config.resolve_timeout,
            self.resolver.resolve(provider, auth_code),
        )
        .await;

        let unavailable = || AuthError::ProviderUnavailable {
            provider: provider.to_string(),
        };

        let err = match outcome {
            Ok(Ok(identity)) => return Ok(identity),
            Err(_) => {
                error!(
                    timeout_ms = u64::try_from(self.config.resolve_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                    "Identity resolution timed out"
                );
                unavailable()
            }
            Ok(Err(
                err @ (AuthError::UnsupportedProvider(_)
                | AuthError::InvalidCode
                | AuthError::ProviderUnavailable { .. }),
            )) => err,
            Ok(Err(other)) => {
                warn!(error = %other, "Resolver returned an error outside its contract");
                unavailable()
            }
        };

        Err(self.login_failed(err))
    }

    /// Return the identity behind `token`, refreshing its activity.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotFound`] or [`AuthError::Expired`].
    #[instrument(skip_all, fields(token_fingerprint = %fingerprint(token)))]
    pub async fn validate(&self, token: &str) -> Result<Identity> {
        self.store
            .validate(token)
            .await
            .map_err(|err| self.session_failed(err))
    }

    /// End the session behind `token`. Returns whether one existed.
    ///
    /// A session already past a deadline but not yet swept is still removed
    /// (and counts as existing), but reports `SessionExpired` rather than
    /// `SignedOut`.
    #[instrument(skip_all, fields(token_fingerprint = %fingerprint(token)))]
    pub async fn logout(&self, token: &str) -> bool {
        match self.store.remove_checked(token).await {
            Some((_, Some(reason))) => {
                self.emit(AuthEvent::SessionExpired {
                    reason: reason.to_string(),
                });
                true
            }
            Some((session, None)) => {
                self.emit(AuthEvent::SignedOut {
                    user_id: session.identity.id,
                });
                true
            }
            None => false,
        }
    }

    /// Swap `token` for a fresh one bound to the same identity.
    ///
    /// # Errors
    ///
    /// [`AuthError::NotFound`] or [`AuthError::Expired`]; the old token is
    /// gone in the expired case and no new one exists.
    #[instrument(skip_all, fields(token_fingerprint = %fingerprint(token)))]
    pub async fn rotate(&self, token: &str) -> Result<SessionToken> {
        let (new_token, identity) = self
            .store
            .rotate_session(token)
            .await
            .map_err(|err| self.session_failed(err))?;

        self.emit(AuthEvent::SessionRotated {
            user_id: identity.id,
        });

        Ok(new_token)
    }

    /// Periodically purge expired sessions in the background.
    ///
    /// The task runs until the returned handle is aborted. Periods below
    /// 10ms are raised to 10ms.
    pub fn spawn_session_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let event_bus = self.event_bus.clone();
        let period = period.max(MIN_SWEEP_INTERVAL);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let purged = store.purge_expired().await;
                if purged > 0 {
                    debug!(purged, "Session sweeper removed expired sessions");
                    let _ = event_bus.emit(CoreEvent::Auth(AuthEvent::SessionExpired {
                        reason: "sweep".to_string(),
                    }));
                }
            }
        })
    }

    fn session_failed(&self, err: AuthError) -> AuthError {
        if let AuthError::Expired { reason } = &err {
            self.emit(AuthEvent::SessionExpired {
                reason: reason.to_string(),
            });
        }
        err
    }

    fn login_failed(&self, err: AuthError) -> AuthError {
        self.emit(AuthEvent::AuthError {
            message: err.to_string(),
            recoverable: err.is_recoverable(),
        });
        err
    }

    fn emit(&self, event: AuthEvent) {
        // No subscribers is fine.
        let _ = self.event_bus.emit(CoreEvent::Auth(event));
    }
}
