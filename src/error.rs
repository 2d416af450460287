//! Error types for crashprobe

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in crashprobe
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error (socket bind, accept)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bind address could not be parsed
    #[error("Invalid bind address '{addr}': {reason}")]
    InvalidBindAddress { addr: String, reason: String },

    /// Telemetry connection string is malformed
    #[error("Invalid telemetry connection string: {0}")]
    InvalidConnectionString(String),

    /// Telemetry exporter construction failed
    #[error("Telemetry initialization failed: {0}")]
    TelemetryInit(String),

    /// The one fault this application exists to produce.
    ///
    /// Raised by the fault trigger on every invocation of the crash
    /// endpoint; never recovered. The serving layer converts it into a
    /// 500 response.
    #[error("IntentionalCrash: the system received a direct instruction to fail.")]
    IntentionalFault,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intentional_fault_message_is_fixed() {
        let a = Error::IntentionalFault.to_string();
        let b = Error::IntentionalFault.to_string();
        assert_eq!(a, b);
        assert_eq!(
            a,
            "IntentionalCrash: the system received a direct instruction to fail."
        );
    }
}
