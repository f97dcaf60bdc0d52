use std::fmt;
use std::io::Read;
use std::sync::Arc;

use crate::account::{Account, DirectoryEntry};
use crate::error::ClientResult;

/// A named container within an account.
///
/// Cloning is cheap; all clones talk to the same account.
#[derive(Clone)]
pub struct Container {
    account: Arc<dyn Account>,
    name: String,
}

impl Container {
    pub fn new(account: Arc<dyn Account>, name: impl Into<String>) -> Self {
        Self {
            account,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exists(&self) -> ClientResult<bool> {
        self.account.container_exists(&self.name)
    }

    pub fn create(&self) -> ClientResult<()> {
        self.account.create_container(&self.name)
    }

    pub fn make_public(&self) -> ClientResult<()> {
        self.account.make_public(&self.name)
    }

    /// Handle to the object at `key`. No I/O.
    pub fn object(&self, key: impl Into<String>) -> StoredObject {
        StoredObject {
            account: Arc::clone(&self.account),
            container: self.name.clone(),
            key: key.into(),
        }
    }

    pub fn list_directory(&self, prefix: &str, delimiter: char) -> ClientResult<Vec<DirectoryEntry>> {
        self.account.list_directory(&self.name, prefix, delimiter)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container").field("name", &self.name).finish()
    }
}

/// An object key within a container. The object may or may not exist.
#[derive(Clone)]
pub struct StoredObject {
    account: Arc<dyn Account>,
    container: String,
    key: String,
}

impl StoredObject {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn exists(&self) -> ClientResult<bool> {
        self.account.object_exists(&self.container, &self.key)
    }

    pub fn content_length(&self) -> ClientResult<u64> {
        self.account.object_length(&self.container, &self.key)
    }

    pub fn delete(&self) -> ClientResult<()> {
        self.account.delete_object(&self.container, &self.key)
    }

    pub fn download(&self) -> ClientResult<Box<dyn Read + Send>> {
        self.account.download(&self.container, &self.key)
    }

    pub fn upload(&self, source: impl Read + Send + 'static) -> ClientResult<()> {
        self.account.upload(&self.container, &self.key, Box::new(source))
    }
}

impl fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredObject")
            .field("container", &self.container)
            .field("key", &self.key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryAccount;

    fn container() -> (Arc<InMemoryAccount>, Container) {
        let account = Arc::new(InMemoryAccount::new());
        let container = Container::new(account.clone(), "snapshots");
        (account, container)
    }

    #[test]
    fn create_and_make_public() {
        let (account, container) = container();
        assert!(!container.exists().unwrap());
        container.create().unwrap();
        container.make_public().unwrap();
        assert!(container.exists().unwrap());
        assert!(account.is_public("snapshots"));
    }

    #[test]
    fn object_lifecycle() {
        let (_account, container) = container();
        container.create().unwrap();

        let object = container.object("a/b");
        assert_eq!(object.key(), "a/b");
        assert_eq!(object.container(), "snapshots");
        assert!(!object.exists().unwrap());

        object.upload(&b"hello"[..]).unwrap();
        assert!(object.exists().unwrap());
        assert_eq!(object.content_length().unwrap(), 5);

        let mut content = Vec::new();
        object.download().unwrap().read_to_end(&mut content).unwrap();
        assert_eq!(content, b"hello");

        object.delete().unwrap();
        assert!(!object.exists().unwrap());
        assert!(object.delete().unwrap_err().is_not_found());
    }

    #[test]
    fn debug_omits_account() {
        let (_account, container) = container();
        let debug = format!("{:?}", container.object("k"));
        assert!(debug.contains("snapshots"));
        assert!(debug.contains("\"k\""));
    }
}
