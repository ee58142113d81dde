//! Identity resolution contract.
//!
//! The session core never talks to an OAuth2 provider itself. It asks an
//! [`IdentityResolver`] to turn `(provider, auth_code)` into an [`Identity`]
//! and trusts the answer. A live implementation performs the code exchange
//! and a userinfo call; [`StaticIdentityResolver`] answers from an in-process
//! table for development and tests.
//!
//! # Contract
//!
//! - `UnsupportedProvider` if the provider is not on the configured allow-list
//! - `InvalidCode` if the code is empty or malformed, or the provider rejects it
//! - `ProviderUnavailable` for any downstream failure
//!
//! Implementations must not put provider secrets or downstream error text
//! into the returned error; log it locally instead.

use crate::error::{AuthError, Result};
use crate::types::Identity;
use async_trait::async_trait;
use core_runtime::config::normalize_provider;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Longest authorization code accepted before it reaches a resolver
pub const MAX_AUTH_CODE_LEN: usize = 2048;

/// Resolves a provider authorization code to a verified identity.
///
/// Called outside any session-store lock; implementations may perform I/O.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, provider: &str, auth_code: &str) -> Result<Identity>;
}

/// Reject codes that cannot possibly be valid.
///
/// A code must be non-empty, at most [`MAX_AUTH_CODE_LEN`] bytes, and consist
/// of printable ASCII without whitespace.
///
/// ```
/// use core_auth::{validate_auth_code, AuthError};
///
/// assert!(validate_auth_code("4/0AbCdEf-gh_ij").is_ok());
/// assert_eq!(validate_auth_code("   "), Err(AuthError::InvalidCode));
/// assert_eq!(validate_auth_code("a b"), Err(AuthError::InvalidCode));
/// ```
pub fn validate_auth_code(auth_code: &str) -> Result<()> {
    if auth_code.trim().is_empty()
        || auth_code.len() > MAX_AUTH_CODE_LEN
        || !auth_code.bytes().all(|b| b.is_ascii_graphic())
    {
        return Err(AuthError::InvalidCode);
    }
    Ok(())
}

/// Profile data a resolver returns before it is stamped into an [`Identity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityProfile {
    pub id: String,
    pub email: String,
    pub display_name: String,
}

impl IdentityProfile {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            display_name: display_name.into(),
        }
    }

    /// The deterministic profile handed out for `provider` when fallback
    /// profiles are enabled: `<provider>_user_<suffix>`, `user@<provider>.com`,
    /// `<Provider> User`.
    fn fallback(provider: &str, auth_code: &str) -> Self {
        let suffix: u32 = auth_code
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(u32::from(b)))
            % 1000;
        Self {
            id: format!("{}_user_{}", provider, suffix),
            email: format!("user@{}.com", provider),
            display_name: format!("{} User", title_case(provider)),
        }
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Deterministic in-process resolver.
///
/// Answers from a `(provider, code) → profile` table. Each successful call
/// yields a fresh [`Identity`] stamped with the current time.
///
/// # Examples
///
/// ```
/// use core_auth::{IdentityProfile, IdentityResolver, StaticIdentityResolver};
///
/// # #[tokio::main]
/// # async fn main() -> core_auth::Result<()> {
/// let resolver = StaticIdentityResolver::new(["google", "github"])
///     .with_identity("github", "code-123", IdentityProfile::new("github_user_1", "octo@github.com", "Octo Cat"));
///
/// let identity = resolver.resolve("github", "code-123").await?;
/// assert_eq!(identity.id, "github_user_1");
/// assert!(resolver.resolve("github", "unknown").await.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    allowed_providers: BTreeSet<String>,
    profiles: HashMap<(String, String), IdentityProfile>,
    fallback_profiles: bool,
}

impl StaticIdentityResolver {
    /// Create a resolver accepting the given providers (case-insensitive).
    pub fn new<I, S>(allowed_providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_providers: allowed_providers
                .into_iter()
                .map(|p| normalize_provider(p.as_ref()))
                .collect(),
            profiles: HashMap::new(),
            fallback_profiles: false,
        }
    }

    /// Register the profile returned for `(provider, auth_code)`.
    pub fn with_identity(
        mut self,
        provider: impl AsRef<str>,
        auth_code: impl Into<String>,
        profile: IdentityProfile,
    ) -> Self {
        self.profiles.insert(
            (normalize_provider(provider.as_ref()), auth_code.into()),
            profile,
        );
        self
    }

    /// When enabled, any well-formed code for an allowed provider resolves to
    /// a profile derived from the provider name and the code.
    pub fn with_fallback_profiles(mut self, enabled: bool) -> Self {
        self.fallback_profiles = enabled;
        self
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, provider: &str, auth_code: &str) -> Result<Identity> {
        let provider = normalize_provider(provider);

        if !self.allowed_providers.contains(&provider) {
            warn!(provider = %provider, "Rejected unsupported provider");
            return Err(AuthError::UnsupportedProvider(provider));
        }

        validate_auth_code(auth_code)?;

        let profile = match self.profiles.get(&(provider.clone(), auth_code.to_string())) {
            Some(profile) => profile.clone(),
            None if self.fallback_profiles => IdentityProfile::fallback(&provider, auth_code),
            None => {
                debug!(provider = %provider, "No profile registered for authorization code");
                return Err(AuthError::InvalidCode);
            }
        };

        debug!(provider = %provider, user_id = %profile.id, "Identity resolved");

        Ok(Identity::new(
            provider,
            profile.id,
            profile.email,
            profile.display_name,
        ))
    }
}
