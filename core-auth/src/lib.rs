//! # Authentication Session Core
//!
//! Issues, validates, expires and rotates opaque session tokens for users
//! authenticated through an external OAuth2 identity provider.
//!
//! ## Overview
//!
//! - [`IdentityResolver`] turns a provider name and authorization code into a
//!   trusted [`Identity`]. How it does so (live code exchange, directory
//!   lookup, static table) is up to the implementation.
//! - [`SessionStore`] owns the token → session map and enforces both the
//!   absolute session lifetime and the inactivity timeout.
//! - [`AuthManager`] ties the two together for a request-handling layer and
//!   publishes auth events.
//!
//! ## Features
//!
//! - 256-bit URL-safe random tokens, never derived from time
//! - Absolute expiry plus sliding inactivity expiry, both terminal
//! - Atomic rotation (old token gone, new token live, in one critical section)
//! - Errors and logs free of tokens, codes and provider internals

pub mod error;
pub mod manager;
pub mod resolver;
pub mod store;
pub mod token;
pub mod types;

pub use error::{AuthError, Result};
pub use manager::AuthManager;
pub use resolver::{validate_auth_code, IdentityProfile, IdentityResolver, StaticIdentityResolver};
pub use store::SessionStore;
pub use token::SessionToken;
pub use types::{ExpiryReason, Identity, Session};
