use thiserror::Error;

/// Errors raised while setting up the runtime: bad session settings, an
/// unparsable log filter, or a second global subscriber.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
