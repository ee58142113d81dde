//! # Session Configuration Module
//!
//! Provides configuration for the session core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`SessionConfig`]. Values are validated when the builder is finished so a
//! misconfigured process fails at startup instead of on the first request.
//!
//! ## Recognized Options
//!
//! | Option | Default |
//! |--------|---------|
//! | `session_lifetime` | 24 hours |
//! | `inactivity_timeout` | 30 minutes |
//! | `allowed_providers` | `google`, `github` |
//! | `resolve_timeout` | 30 seconds |
//! | `event_buffer_size` | 100 |
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::SessionConfig;
//! use std::time::Duration;
//!
//! let config = SessionConfig::builder()
//!     .session_lifetime(Duration::from_secs(8 * 60 * 60))
//!     .inactivity_timeout(Duration::from_secs(15 * 60))
//!     .allowed_providers(["google", "GitHub", "gitlab"])
//!     .build()
//!     .expect("valid session config");
//!
//! assert!(config.is_provider_allowed("github"));
//! assert!(config.is_provider_allowed("GITLAB"));
//! ```
//!
//! ## Error Handling
//!
//! ```
//! use core_runtime::config::SessionConfig;
//! use std::time::Duration;
//!
//! let result = SessionConfig::builder()
//!     .inactivity_timeout(Duration::ZERO)
//!     .build();
//! assert!(result.is_err());
//! ```

use crate::error::{Error, Result};
use std::collections::BTreeSet;
use std::time::Duration;

/// Default absolute session lifetime (24 hours)
pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Default inactivity timeout (30 minutes)
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Default bound on a single identity-resolution call (30 seconds)
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Providers accepted when none are configured explicitly
pub const DEFAULT_ALLOWED_PROVIDERS: &[&str] = &["google", "github"];

/// Upper bound on `session_lifetime` (365 days)
const MAX_SESSION_LIFETIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Configuration for the session core.
///
/// Use [`SessionConfig::builder`] to construct validated instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Absolute cap on a session's life, measured from issuance
    pub session_lifetime: Duration,

    /// Maximum gap between successful validations
    pub inactivity_timeout: Duration,

    /// Identity providers accepted at login (stored lowercase)
    pub allowed_providers: BTreeSet<String>,

    /// Bound applied to each identity-resolution call
    pub resolve_timeout: Duration,

    /// Buffer size of the auth event channel
    pub event_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_lifetime: DEFAULT_SESSION_LIFETIME,
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
            allowed_providers: DEFAULT_ALLOWED_PROVIDERS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
            event_buffer_size: 100,
        }
    }
}

impl SessionConfig {
    /// Creates a new builder seeded with the defaults.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Session lifetime is non-zero and at most 365 days
    /// - Inactivity and resolve timeouts are non-zero
    /// - At least one provider is allowed, and every provider name is a
    ///   single non-empty word
    /// - Event buffer size is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.session_lifetime.is_zero() {
            return Err(Error::Config(
                "Session lifetime must be greater than zero".to_string(),
            ));
        }

        if self.session_lifetime > MAX_SESSION_LIFETIME {
            return Err(Error::Config(
                "Session lifetime exceeds maximum of 365 days".to_string(),
            ));
        }

        if self.inactivity_timeout.is_zero() {
            return Err(Error::Config(
                "Inactivity timeout must be greater than zero".to_string(),
            ));
        }

        if self.resolve_timeout.is_zero() {
            return Err(Error::Config(
                "Resolve timeout must be greater than zero".to_string(),
            ));
        }

        if self.allowed_providers.is_empty() {
            return Err(Error::Config(
                "At least one identity provider must be allowed. \
                 Configure allowed_providers (e.g. \"google\", \"github\")."
                    .to_string(),
            ));
        }

        for provider in &self.allowed_providers {
            if provider.is_empty() || provider.chars().any(char::is_whitespace) {
                return Err(Error::Config(format!(
                    "Invalid provider name {:?}: names must be non-empty and contain no whitespace",
                    provider
                )));
            }
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Case-insensitive allow-list check.
    pub fn is_provider_allowed(&self, provider: &str) -> bool {
        self.allowed_providers
            .contains(&normalize_provider(provider))
    }
}

/// Canonical form of a provider name: trimmed and lowercased.
pub fn normalize_provider(provider: &str) -> String {
    provider.trim().to_lowercase()
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    session_lifetime: Option<Duration>,
    inactivity_timeout: Option<Duration>,
    allowed_providers: Option<BTreeSet<String>>,
    resolve_timeout: Option<Duration>,
    event_buffer_size: Option<usize>,
}

impl SessionConfigBuilder {
    /// Sets the absolute session lifetime.
    pub fn session_lifetime(mut self, lifetime: Duration) -> Self {
        self.session_lifetime = Some(lifetime);
        self
    }

    /// Sets the inactivity timeout.
    pub fn inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = Some(timeout);
        self
    }

    /// Replaces the provider allow-list. Names are normalised to lowercase.
    pub fn allowed_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_providers = Some(
            providers
                .into_iter()
                .map(|p| normalize_provider(p.as_ref()))
                .collect(),
        );
        self
    }

    /// Adds a single provider to the allow-list (on top of the defaults if no
    /// list was set yet).
    pub fn allow_provider(mut self, provider: impl AsRef<str>) -> Self {
        let providers = self.allowed_providers.get_or_insert_with(|| {
            DEFAULT_ALLOWED_PROVIDERS
                .iter()
                .map(|p| p.to_string())
                .collect()
        });
        providers.insert(normalize_provider(provider.as_ref()));
        self
    }

    /// Sets the identity-resolution timeout.
    pub fn resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = Some(timeout);
        self
    }

    /// Sets the auth event channel buffer size.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when any option is out of range.
    pub fn build(self) -> Result<SessionConfig> {
        let defaults = SessionConfig::default();
        let config = SessionConfig {
            session_lifetime: self.session_lifetime.unwrap_or(defaults.session_lifetime),
            inactivity_timeout: self
                .inactivity_timeout
                .unwrap_or(defaults.inactivity_timeout),
            allowed_providers: self
                .allowed_providers
                .unwrap_or(defaults.allowed_providers),
            resolve_timeout: self.resolve_timeout.unwrap_or(defaults.resolve_timeout),
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(defaults.event_buffer_size),
        };

        config.validate()?;
        Ok(config)
    }
}
