use std::fmt;
use std::io::Read;
use std::sync::Arc;

use swiftrepo_types::AuthMethod;

use crate::error::ClientResult;

/// Everything needed to authenticate against a Swift endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccountConfig {
    pub auth_url: String,
    pub username: String,
    pub password: String,
    pub method: AuthMethod,
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("auth_url", &self.auth_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("method", &self.method)
            .finish()
    }
}

/// One entry of a delimiter listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectoryEntry {
    /// A stored object; `name` is the full object key.
    Object { name: String, content_length: u64 },
    /// A group of keys sharing a prefix up to and including the delimiter.
    Directory { name: String },
}

impl DirectoryEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Object { name, .. } | Self::Directory { name } => name,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object { .. })
    }
}

/// An authenticated Swift account.
///
/// Implementations must be safe to share between threads: one account is
/// used by every store and every upload worker in the process.
/// - Deleting, downloading or measuring a missing object is
///   [`ClientError::NotFound`](crate::ClientError::NotFound).
/// - Listing returns entries in key order.
/// - No operation retries on its own.
pub trait Account: Send + Sync {
    fn container_exists(&self, container: &str) -> ClientResult<bool>;

    fn create_container(&self, container: &str) -> ClientResult<()>;

    /// Grant anonymous read access to the container.
    fn make_public(&self, container: &str) -> ClientResult<()>;

    fn object_exists(&self, container: &str, key: &str) -> ClientResult<bool>;

    /// Content length of an object in bytes.
    fn object_length(&self, container: &str, key: &str) -> ClientResult<u64>;

    fn delete_object(&self, container: &str, key: &str) -> ClientResult<()>;

    /// Open a stream over the object's content.
    fn download(&self, container: &str, key: &str) -> ClientResult<Box<dyn Read + Send>>;

    /// Store the object, consuming `source` to end-of-stream.
    ///
    /// Blocks until the remote side has acknowledged the whole object or the
    /// transfer failed.
    fn upload(&self, container: &str, key: &str, source: Box<dyn Read + Send>) -> ClientResult<()>;

    /// List keys starting with `prefix`, grouping everything past the next
    /// `delimiter` into a single [`DirectoryEntry::Directory`].
    fn list_directory(
        &self,
        container: &str,
        prefix: &str,
        delimiter: char,
    ) -> ClientResult<Vec<DirectoryEntry>>;
}

/// Opens accounts. One call is one authentication round-trip.
pub trait AccountFactory: Send + Sync {
    fn create_account(&self, config: &AccountConfig) -> ClientResult<Arc<dyn Account>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let config = AccountConfig {
            auth_url: "http://store.example/auth/v1.0".into(),
            username: "u".into(),
            password: "hunter2".into(),
            method: AuthMethod::TempAuth,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("store.example"));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn directory_entry_accessors() {
        let obj = DirectoryEntry::Object { name: "a/x".into(), content_length: 3 };
        let dir = DirectoryEntry::Directory { name: "a/b/".into() };
        assert_eq!(obj.name(), "a/x");
        assert_eq!(dir.name(), "a/b/");
        assert!(obj.is_object());
        assert!(!dir.is_object());
    }
}
