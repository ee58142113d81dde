use thiserror::Error;

/// Failures a host `LoggerSink` reports back to the logging layer.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Log sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("Log sink I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error_converts() {
        fn write_entry() -> Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))?;
            Ok(())
        }

        let err = write_entry().unwrap_err();
        assert!(matches!(err, BridgeError::Io(_)));
        assert_eq!(err.to_string(), "Log sink I/O error: pipe closed");
    }

    #[test]
    fn test_sink_unavailable_message() {
        let err = BridgeError::SinkUnavailable("syslog socket missing".to_string());
        assert_eq!(err.to_string(), "Log sink unavailable: syslog socket missing");
    }
}
