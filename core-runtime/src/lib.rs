//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the session core:
//! - Session configuration with fail-fast validation
//! - Logging and tracing infrastructure
//! - Event bus for authentication events
//!
//! ## Overview
//!
//! Nothing here knows about tokens or identities. `core-auth` builds on these
//! pieces; a host process initialises logging once, builds a
//! [`SessionConfig`](config::SessionConfig), and subscribes to the
//! [`EventBus`](events::EventBus) if it wants audit notifications.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
