use swiftrepo_client::ClientError;
use swiftrepo_types::TypeError;
use thiserror::Error;

/// Errors surfaced by the blob store adapter.
#[derive(Debug, Error)]
pub enum BlobStoreError {
    /// The session could not be opened. Fatal; the repository cannot start.
    #[error("unable to authenticate to swift ({method}) at {endpoint}")]
    Authentication {
        method: &'static str,
        endpoint: String,
        #[source]
        source: ClientError,
    },

    /// The container could not be looked up, created or made public.
    #[error("unable to provision container {container}")]
    ContainerProvision {
        container: String,
        #[source]
        source: ClientError,
    },

    /// The blob does not exist.
    #[error("blob not found: {key}")]
    NotFound { key: String },

    /// The remote store failed while serving an operation.
    #[error("{op} failed for {key}")]
    Remote {
        op: &'static str,
        key: String,
        #[source]
        source: ClientError,
    },

    /// Local I/O failure, e.g. the upload worker could not be started.
    #[error("I/O error during {op} of {key}")]
    Io {
        op: &'static str,
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid repository settings: {0}")]
    Settings(String),

    #[error("invalid blob path: {0}")]
    Path(#[from] TypeError),
}

impl BlobStoreError {
    /// Attach operation context to a client failure. A missing object becomes
    /// [`BlobStoreError::NotFound`].
    pub fn remote(op: &'static str, key: &str, source: ClientError) -> Self {
        match source {
            ClientError::NotFound(_) => Self::NotFound { key: key.to_string() },
            source => Self::Remote {
                op,
                key: key.to_string(),
                source,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias for blob store operations.
pub type StoreResult<T> = Result<T, BlobStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_maps_not_found() {
        let err = BlobStoreError::remote("open_input", "a/b", ClientError::NotFound("c/a/b".into()));
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "blob not found: a/b");
    }

    #[test]
    fn remote_keeps_context() {
        let source = ClientError::Http {
            method: "GET".into(),
            url: "http://swift.example/v1/AUTH_t/c/a".into(),
            status: 500,
            message: "boom".into(),
        };
        let err = BlobStoreError::remote("open_input", "a", source);
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "open_input failed for a");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn invalid_object_path_is_a_remote_failure() {
        let source = ClientError::InvalidUrl("dot segment in object path c/..".into());
        let err = BlobStoreError::remote("blob_exists", "..", source);
        assert!(matches!(err, BlobStoreError::Remote { op: "blob_exists", .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn authentication_message_has_no_secrets() {
        let err = BlobStoreError::Authentication {
            method: "tempauth",
            endpoint: "http://store.example/auth/v1.0".into(),
            source: ClientError::Authentication("HTTP 401".into()),
        };
        assert_eq!(
            err.to_string(),
            "unable to authenticate to swift (tempauth) at http://store.example/auth/v1.0"
        );
    }
}
