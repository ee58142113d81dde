//! # Host Bridge Traits
//!
//! Abstractions the session core requires from its host but does not
//! implement itself.
//!
//! ## Traits
//!
//! - [`Clock`](time::Clock) - Time source; the session store reads every
//!   timestamp through it so expiry can be tested deterministically
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to a host
//!   logging pipeline
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind an `Arc`.

pub mod error;
pub mod time;

pub use error::BridgeError;

pub use time::{Clock, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
