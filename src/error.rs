//! Error types for trellis operations

use thiserror::Error;

/// Main error type for trellis operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A manifest document violates the caller contract (missing or
    /// malformed `metadata`, non-object document, ...)
    #[error("manifest error: {0}")]
    Manifest(String),

    /// YAML input could not be parsed into documents
    #[error("yaml error: {0}")]
    Yaml(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The applier failed to hand the payload to the cluster
    #[error("apply error: {0}")]
    Apply(String),

    /// Helm chart options are invalid or the helm invocation failed
    #[error("helm error: {0}")]
    Helm(String),

    /// Filesystem error while staging payloads for the applier
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a manifest error with the given message
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }

    /// Create a YAML error with the given message
    pub fn yaml(msg: impl Into<String>) -> Self {
        Self::Yaml(msg.into())
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Create an apply error with the given message
    pub fn apply(msg: impl Into<String>) -> Self {
        Self::Apply(msg.into())
    }

    /// Create a helm error with the given message
    pub fn helm(msg: impl Into<String>) -> Self {
        Self::Helm(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_category_and_message() {
        let err = Error::manifest("document 2 (Pod) has no metadata");
        assert!(err.to_string().contains("manifest error"));
        assert!(err.to_string().contains("document 2"));

        let err = Error::apply("kubectl apply failed: connection refused");
        assert!(err.to_string().contains("apply error"));
        assert!(err.to_string().contains("connection refused"));

        let err = Error::helm("timeout must be at most 900s");
        assert!(err.to_string().contains("helm error"));
    }

    #[test]
    fn test_error_constructors_accept_string_and_str() {
        let dynamic = format!("set {} is malformed", "MyStack/MyManifest");
        let err = Error::manifest(dynamic);
        assert!(err.to_string().contains("MyStack/MyManifest"));

        match Error::yaml("bad indent") {
            Error::Yaml(msg) => assert_eq!(msg, "bad indent"),
            _ => panic!("Expected Yaml variant"),
        }
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::other("disk full");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
