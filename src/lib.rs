//! Workspace facade crate.
//!
//! Re-exports the session core (`core-auth`), its runtime support
//! (`core-runtime`) and the host bridge traits so a request-handling layer
//! can depend on a single crate.

pub use bridge_traits::time::{Clock, ManualClock, SystemClock};
pub use core_auth::{
    validate_auth_code, AuthError, AuthManager, ExpiryReason, Identity, IdentityProfile,
    IdentityResolver, Session, SessionStore, SessionToken, StaticIdentityResolver,
};
pub use core_runtime::config::{SessionConfig, SessionConfigBuilder};
pub use core_runtime::events::{AuthEvent, CoreEvent, EventBus, EventStream};
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
