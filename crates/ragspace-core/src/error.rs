//! Error types for ragspace.

use thiserror::Error;

/// Main error type for ragspace operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Connector operation failed
    #[error("connector error: {0}")]
    Connect(#[from] ConnectError),

    /// AI provider call failed
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A referenced record does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Connector errors.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("invalid connector config: {0}")]
    InvalidConfig(String),

    /// Path traversal or other sandbox escape. Thrown, never silently ignored.
    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// AI provider errors. These are never retried; a failure aborts the current
/// file or query.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider not available: {0}")]
    Unavailable(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("stream error: {0}")]
    Stream(String),
}

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store initialization failed: {0}")]
    Init(String),

    #[error("insert failed: {0}")]
    Insert(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("serialization failed: {0}")]
    Serialize(String),
}

/// Result type alias for ragspace operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_display() {
        let err = ConnectError::AccessDenied("/etc/passwd".to_string());
        assert_eq!(err.to_string(), "access denied: /etc/passwd");
    }

    #[test]
    fn test_provider_error_api_display() {
        let err = ProviderError::Api {
            status: 429,
            message: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "api error (429): quota exceeded");
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Query("no such table".to_string());
        assert_eq!(err.to_string(), "query failed: no such table");
    }

    #[test]
    fn test_error_from_connect_error() {
        let err: Error = ConnectError::NotFound("/missing".to_string()).into();
        assert!(matches!(err, Error::Connect(_)));
        assert!(err.to_string().contains("/missing"));
    }

    #[test]
    fn test_error_from_provider_error() {
        let err: Error = ProviderError::Unavailable("gemini".to_string()).into();
        assert!(matches!(err, Error::Provider(_)));
    }

    #[test]
    fn test_error_from_store_error() {
        let err: Error = StoreError::Insert("constraint".to_string()).into();
        assert!(matches!(err, Error::Store(_)));
    }

    #[test]
    fn test_error_chain_io_to_connect_to_main() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "notes.txt not found");
        let connect_err: ConnectError = io_err.into();
        let main_err: Error = connect_err.into();

        assert!(matches!(main_err, Error::Connect(ConnectError::Io(_))));
        assert!(main_err.to_string().contains("connector error"));
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound("workspace 42".to_string());
        assert_eq!(err.to_string(), "not found: workspace 42");
    }
}
