//! Error taxonomy shared across every external boundary of the bridge core.
//!
//! Library code returns [`Result<T>`] (an alias over [`BridgeError`]); the
//! demo binary and any glue code that talks to the outside world wrap these
//! in `anyhow::Result` instead.

use thiserror::Error;

/// Canonical error taxonomy surfaced across the DataSource/DataSink boundary.
///
/// Call sites should prefer the most specific applicable variant;
/// `UnknownError` is reserved for genuinely unclassifiable failures (panics
/// caught at a boundary, I/O errors with no clearer mapping), never used as
/// a catch-all of convenience.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("protocol error: {0}")]
    ProtocolError(String),

    #[error("buffer overflow: {0}")]
    BufferOverflow(String),

    #[error("insufficient memory: {0}")]
    InsufficientMemory(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("configuration parse error: {0}")]
    ConfigParseError(String),

    #[error("OS error: {0}")]
    OsError(String),

    #[error("unknown error: {0}")]
    UnknownError(String),
}

impl BridgeError {
    /// The stable error-code name, for metrics labels and log fields.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::InvalidArgument(_) => "INVALID_ARGUMENT",
            BridgeError::InvalidState(_) => "INVALID_STATE",
            BridgeError::Timeout(_) => "TIMEOUT",
            BridgeError::ConnectionFailed(_) => "CONNECTION_FAILED",
            BridgeError::ProtocolError(_) => "PROTOCOL_ERROR",
            BridgeError::BufferOverflow(_) => "BUFFER_OVERFLOW",
            BridgeError::InsufficientMemory(_) => "INSUFFICIENT_MEMORY",
            BridgeError::PermissionDenied(_) => "PERMISSION_DENIED",
            BridgeError::NotFound(_) => "NOT_FOUND",
            BridgeError::AlreadyExists(_) => "ALREADY_EXISTS",
            BridgeError::NotImplemented(_) => "NOT_IMPLEMENTED",
            BridgeError::ConfigParseError(_) => "CONFIG_PARSE_ERROR",
            BridgeError::OsError(_) => "OS_ERROR",
            BridgeError::UnknownError(_) => "UNKNOWN_ERROR",
        }
    }

    /// Wrap a caught panic payload as an `UnknownError`: no panic from a
    /// user-supplied predicate or sink may unwind across a thread boundary.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with non-string payload".to_string()
        };
        BridgeError::UnknownError(msg)
    }
}

/// Library-internal result alias. The demo binary and test glue convert to
/// `anyhow::Result` at the boundary.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_names_match_taxonomy() {
        assert_eq!(BridgeError::NotFound("x".into()).code(), "NOT_FOUND");
        assert_eq!(
            BridgeError::BufferOverflow("full".into()).code(),
            "BUFFER_OVERFLOW"
        );
    }

    #[test]
    fn from_panic_extracts_string_payload() {
        let result = std::panic::catch_unwind(|| panic!("boom"));
        let err = BridgeError::from_panic(&*result.unwrap_err());
        assert!(matches!(err, BridgeError::UnknownError(ref m) if m == "boom"));
    }
}
