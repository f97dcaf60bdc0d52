use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use bytes::Bytes;

use crate::account::{Account, AccountConfig, AccountFactory, DirectoryEntry};
use crate::error::{ClientError, ClientResult};

#[derive(Default)]
struct MemoryContainer {
    public: bool,
    objects: BTreeMap<String, Bytes>,
}

/// In-memory Swift account.
///
/// Intended for tests and embedding. Containers and objects live behind a
/// `RwLock`; listing follows Swift's delimiter semantics.
pub struct InMemoryAccount {
    containers: RwLock<HashMap<String, MemoryContainer>>,
    fail_uploads: AtomicBool,
}

impl InMemoryAccount {
    pub fn new() -> Self {
        Self {
            containers: RwLock::new(HashMap::new()),
            fail_uploads: AtomicBool::new(false),
        }
    }

    /// Make every subsequent upload fail after its source has been drained,
    /// the way a server rejecting the finished request would.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn is_public(&self, container: &str) -> bool {
        self.containers
            .read()
            .expect("lock poisoned")
            .get(container)
            .is_some_and(|c| c.public)
    }

    /// Store an object directly, creating the container if needed.
    pub fn put_object(&self, container: &str, key: &str, data: impl Into<Bytes>) {
        let mut map = self.containers.write().expect("lock poisoned");
        map.entry(container.to_string())
            .or_default()
            .objects
            .insert(key.to_string(), data.into());
    }

    /// Sorted keys of every object in `container`.
    pub fn keys(&self, container: &str) -> Vec<String> {
        self.containers
            .read()
            .expect("lock poisoned")
            .get(container)
            .map(|c| c.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn with_container<T>(
        &self,
        container: &str,
        f: impl FnOnce(&MemoryContainer) -> ClientResult<T>,
    ) -> ClientResult<T> {
        let map = self.containers.read().expect("lock poisoned");
        let c = map
            .get(container)
            .ok_or_else(|| ClientError::NotFound(format!("container {container}")))?;
        f(c)
    }

    fn with_container_mut<T>(
        &self,
        container: &str,
        f: impl FnOnce(&mut MemoryContainer) -> ClientResult<T>,
    ) -> ClientResult<T> {
        let mut map = self.containers.write().expect("lock poisoned");
        let c = map
            .get_mut(container)
            .ok_or_else(|| ClientError::NotFound(format!("container {container}")))?;
        f(c)
    }
}

impl Default for InMemoryAccount {
    fn default() -> Self {
        Self::new()
    }
}

impl Account for InMemoryAccount {
    fn container_exists(&self, container: &str) -> ClientResult<bool> {
        Ok(self.containers.read().expect("lock poisoned").contains_key(container))
    }

    fn create_container(&self, container: &str) -> ClientResult<()> {
        let mut map = self.containers.write().expect("lock poisoned");
        map.entry(container.to_string()).or_default();
        Ok(())
    }

    fn make_public(&self, container: &str) -> ClientResult<()> {
        self.with_container_mut(container, |c| {
            c.public = true;
            Ok(())
        })
    }

    fn object_exists(&self, container: &str, key: &str) -> ClientResult<bool> {
        let map = self.containers.read().expect("lock poisoned");
        Ok(map.get(container).is_some_and(|c| c.objects.contains_key(key)))
    }

    fn object_length(&self, container: &str, key: &str) -> ClientResult<u64> {
        self.with_container(container, |c| {
            c.objects
                .get(key)
                .map(|data| data.len() as u64)
                .ok_or_else(|| ClientError::NotFound(format!("{container}/{key}")))
        })
    }

    fn delete_object(&self, container: &str, key: &str) -> ClientResult<()> {
        self.with_container_mut(container, |c| {
            c.objects
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| ClientError::NotFound(format!("{container}/{key}")))
        })
    }

    fn download(&self, container: &str, key: &str) -> ClientResult<Box<dyn Read + Send>> {
        self.with_container(container, |c| {
            let data = c
                .objects
                .get(key)
                .cloned()
                .ok_or_else(|| ClientError::NotFound(format!("{container}/{key}")))?;
            Ok(Box::new(Cursor::new(data)) as Box<dyn Read + Send>)
        })
    }

    fn upload(&self, container: &str, key: &str, mut source: Box<dyn Read + Send>) -> ClientResult<()> {
        if !self.container_exists(container)? {
            return Err(ClientError::NotFound(format!("container {container}")));
        }
        // The lock is not held while the source is drained; the producer may
        // be slow.
        let mut data = Vec::new();
        source.read_to_end(&mut data)?;

        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(ClientError::Http {
                method: "PUT".into(),
                url: format!("memory://{container}/{key}"),
                status: 503,
                message: "upload rejected".into(),
            });
        }

        self.with_container_mut(container, |c| {
            c.objects.insert(key.to_string(), Bytes::from(data));
            Ok(())
        })
    }

    fn list_directory(
        &self,
        container: &str,
        prefix: &str,
        delimiter: char,
    ) -> ClientResult<Vec<DirectoryEntry>> {
        self.with_container(container, |c| {
            let mut entries: Vec<DirectoryEntry> = Vec::new();
            let matching = c
                .objects
                .range(prefix.to_string()..)
                .take_while(|(key, _)| key.starts_with(prefix));
            for (key, data) in matching {
                let rest = &key[prefix.len()..];
                match rest.find(delimiter) {
                    Some(idx) => {
                        let name = format!("{prefix}{}", &rest[..idx + delimiter.len_utf8()]);
                        let seen = entries.last().is_some_and(|last| last.name() == name);
                        if !seen {
                            entries.push(DirectoryEntry::Directory { name });
                        }
                    }
                    None => entries.push(DirectoryEntry::Object {
                        name: key.clone(),
                        content_length: data.len() as u64,
                    }),
                }
            }
            Ok(entries)
        })
    }
}

impl std::fmt::Debug for InMemoryAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.containers.read().expect("lock poisoned").len();
        f.debug_struct("InMemoryAccount")
            .field("container_count", &count)
            .finish()
    }
}

/// Factory handing out one shared [`InMemoryAccount`].
///
/// Counts authentication attempts and can be told to reject credentials, which
/// is what the session tests need.
pub struct InMemoryAccountFactory {
    account: Arc<InMemoryAccount>,
    attempts: AtomicUsize,
    reject: AtomicBool,
    auth_delay: Duration,
}

impl InMemoryAccountFactory {
    pub fn new(account: Arc<InMemoryAccount>) -> Self {
        Self {
            account,
            attempts: AtomicUsize::new(0),
            reject: AtomicBool::new(false),
            auth_delay: Duration::ZERO,
        }
    }

    /// Sleep this long inside every authentication attempt.
    pub fn with_auth_delay(mut self, delay: Duration) -> Self {
        self.auth_delay = delay;
        self
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Number of `create_account` calls so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn account(&self) -> Arc<InMemoryAccount> {
        Arc::clone(&self.account)
    }
}

impl AccountFactory for InMemoryAccountFactory {
    fn create_account(&self, config: &AccountConfig) -> ClientResult<Arc<dyn Account>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.auth_delay.is_zero() {
            thread::sleep(self.auth_delay);
        }
        if self.reject.load(Ordering::SeqCst) {
            return Err(ClientError::Authentication(format!(
                "{} rejected credentials for {}",
                config.auth_url, config.username
            )));
        }
        Ok(self.account.clone())
    }
}
