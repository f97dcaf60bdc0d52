//! Path-scoped view of the Swift container.
//!
//! A [`SwiftBlobContainer`] maps blob names onto flat object keys by
//! prefixing them with the key prefix of its [`BlobPath`]. Listing is
//! non-recursive: Swift groups everything below the next `/` into a
//! directory entry, and directories are not blobs.

use std::fmt;
use std::io::{BufReader, Read};

use swiftrepo_client::DirectoryEntry;
use swiftrepo_types::path::KEY_SEPARATOR;
use swiftrepo_types::{BlobMetadata, BlobPath};
use tracing::debug;

use crate::error::{BlobStoreError, StoreResult};
use crate::store::SwiftBlobStore;
use crate::traits::{BlobContainer, BlobMap};
use crate::upload::UploadSink;

#[derive(Clone)]
pub struct SwiftBlobContainer {
    path: BlobPath,
    key_path: String,
    store: SwiftBlobStore,
}

impl SwiftBlobContainer {
    /// Bind `store` to `path`. No I/O.
    pub fn new(path: BlobPath, store: SwiftBlobStore) -> Self {
        let key_path = path.key_prefix();
        Self { path, key_path, store }
    }

    /// Key prefix shared by every blob in this container.
    pub fn key_path(&self) -> &str {
        &self.key_path
    }

    /// Object key of `blob_name`: the key path followed by the name, verbatim.
    pub fn build_key(&self, blob_name: &str) -> String {
        format!("{}{}", self.key_path, blob_name)
    }
}

impl BlobContainer for SwiftBlobContainer {
    type Input = BufReader<Box<dyn Read + Send>>;
    type Output = UploadSink;

    fn path(&self) -> &BlobPath {
        &self.path
    }

    fn blob_exists(&self, blob_name: &str) -> StoreResult<bool> {
        let key = self.build_key(blob_name);
        self.store
            .container()
            .object(key.as_str())
            .exists()
            .map_err(|e| BlobStoreError::remote("blob_exists", &key, e))
    }

    fn delete_blob(&self, blob_name: &str) -> StoreResult<bool> {
        let key = self.build_key(blob_name);
        let object = self.store.container().object(key.as_str());
        let exists = object
            .exists()
            .map_err(|e| BlobStoreError::remote("delete_blob", &key, e))?;
        if exists {
            match object.delete() {
                Ok(()) => debug!(key = %key, "blob deleted"),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(BlobStoreError::remote("delete_blob", &key, e)),
            }
        }
        Ok(true)
    }

    fn list_blobs_by_prefix(&self, blob_prefix: Option<&str>) -> StoreResult<BlobMap> {
        let prefix = match blob_prefix {
            Some(blob_prefix) => self.build_key(blob_prefix),
            None => self.key_path.clone(),
        };
        let entries = match self.store.container().list_directory(&prefix, KEY_SEPARATOR) {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(BlobStoreError::remote("list_blobs", &prefix, e)),
        };

        let mut blobs = BlobMap::new();
        for entry in entries {
            if let DirectoryEntry::Object { name, content_length } = entry {
                let Some(blob_name) = name.strip_prefix(self.key_path.as_str()) else {
                    continue;
                };
                blobs.insert(
                    blob_name.to_string(),
                    BlobMetadata::new(blob_name, content_length),
                );
            }
        }
        debug!(prefix = %prefix, count = blobs.len(), "listed blobs");
        Ok(blobs)
    }

    fn open_input(&self, blob_name: &str) -> StoreResult<Self::Input> {
        let key = self.build_key(blob_name);
        let source = self
            .store
            .container()
            .object(key.as_str())
            .download()
            .map_err(|e| BlobStoreError::remote("open_input", &key, e))?;
        Ok(BufReader::with_capacity(self.store.buffer_size_in_bytes(), source))
    }

    /// Replace the blob with whatever is written to the returned sink.
    ///
    /// Any existing blob is deleted before the upload starts. The new content
    /// is stored once the sink is closed successfully.
    fn create_output(&self, blob_name: &str) -> StoreResult<Self::Output> {
        self.delete_blob(blob_name)?;
        let key = self.build_key(blob_name);
        UploadSink::start(self.store.container().object(key))
    }
}

impl fmt::Debug for SwiftBlobContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwiftBlobContainer")
            .field("path", &self.path)
            .field("key_path", &self.key_path)
            .field("store", &self.store)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use std::collections::BTreeSet;
    use std::thread;
    use proptest::prelude::*;
    use swiftrepo_client::{Account, InMemoryAccount, InMemoryAccountFactory};

    use crate::session::{SessionManager, SessionRequest};
    use crate::store::DEFAULT_BUFFER_SIZE;
    use crate::traits::{BlobSink, BlobStore};

    fn store() -> (Arc<InMemoryAccount>, SwiftBlobStore) {
        let account = Arc::new(InMemoryAccount::new());
        let manager = SessionManager::new(Arc::new(InMemoryAccountFactory::new(account.clone())));
        let session = manager.get_session(&SessionRequest::default()).unwrap();
        let store = SwiftBlobStore::new(DEFAULT_BUFFER_SIZE, &session, "c").unwrap();
        (account, store)
    }

    fn write_blob(container: &SwiftBlobContainer, name: &str, content: &[u8]) {
        let mut sink = container.create_output(name).unwrap();
        sink.write_all(content).unwrap();
        BlobSink::close(&mut sink).unwrap();
    }

    fn read_blob(container: &SwiftBlobContainer, name: &str) -> Vec<u8> {
        let mut content = Vec::new();
        container.open_input(name).unwrap().read_to_end(&mut content).unwrap();
        content
    }

    // -----------------------------------------------------------------------
    // Keys
    // -----------------------------------------------------------------------

    #[test]
    fn keys_are_prefixed_with_the_path() {
        let (_account, store) = store();
        let root = store.blob_container(&BlobPath::clean());
        assert_eq!(root.key_path(), "");
        assert_eq!(root.build_key("index"), "index");

        let nested = store.blob_container(&BlobPath::parse("indices/idx/0"));
        assert_eq!(nested.key_path(), "indices/idx/0/");
        assert_eq!(nested.build_key("snap-1"), "indices/idx/0/snap-1");
    }

    // -----------------------------------------------------------------------
    // Read/write
    // -----------------------------------------------------------------------

    #[test]
    fn written_blob_reads_back() {
        let (account, store) = store();
        let container = store.blob_container(&BlobPath::parse("a"));

        write_blob(&container, "blob", b"hello swift");

        assert_eq!(read_blob(&container, "blob"), b"hello swift");
        assert!(account.object_exists("c", "a/blob").unwrap());
    }

    #[test]
    fn overwrite_replaces_content() {
        let (_account, store) = store();
        let container = store.blob_container(&BlobPath::parse("a"));

        write_blob(&container, "blob", b"first version, longer");
        write_blob(&container, "blob", b"second");

        assert_eq!(read_blob(&container, "blob"), b"second");
        let blobs = container.list_blobs().unwrap();
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs["blob"].length, 6);
    }

    #[test]
    fn reading_missing_blob_is_not_found() {
        let (_account, store) = store();
        let container = store.blob_container(&BlobPath::parse("a"));

        let Err(err) = container.open_input("nope") else {
            panic!("reading a missing blob should fail");
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "blob not found: a/nope");
    }

    #[test]
    fn concurrent_writers_to_distinct_blobs() {
        let (account, store) = store();
        let container = store.blob_container(&BlobPath::parse("p"));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let container = container.clone();
                thread::spawn(move || {
                    let content = vec![i as u8; 200_000];
                    write_blob(&container, &format!("blob-{i}"), &content);
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer should not panic");
        }

        assert_eq!(account.keys("c").len(), 4);
        assert_eq!(read_blob(&container, "blob-3"), vec![3u8; 200_000]);
    }

    // -----------------------------------------------------------------------
    // Existence and deletion
    // -----------------------------------------------------------------------

    #[test]
    fn delete_then_exists_is_false() {
        let (_account, store) = store();
        let container = store.blob_container(&BlobPath::parse("a"));
        write_blob(&container, "x", b"1");

        assert!(container.blob_exists("x").unwrap());
        assert!(container.delete_blob("x").unwrap());
        assert!(!container.blob_exists("x").unwrap());
    }

    #[test]
    fn deleting_missing_blob_succeeds() {
        let (_account, store) = store();
        let container = store.blob_container(&BlobPath::parse("a"));
        assert!(container.delete_blob("never-written").unwrap());
        assert!(!container.blob_exists("never-written").unwrap());
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    #[test]
    fn listing_is_not_recursive() {
        let (account, store) = store();
        account.put_object("c", "a/x", &b"xx"[..]);
        account.put_object("c", "a/y", &b"yyy"[..]);
        account.put_object("c", "a/b/z", &b"z"[..]);
        account.put_object("c", "other/w", &b"w"[..]);

        let blobs = store.blob_container(&BlobPath::parse("a")).list_blobs().unwrap();

        assert_eq!(blobs.keys().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(blobs["x"], BlobMetadata::new("x", 2));
        assert_eq!(blobs["y"].length, 3);
        assert!(!blobs.contains_key("b"));
        assert!(!blobs.contains_key("b/z"));
    }

    #[test]
    fn listing_by_prefix() {
        let (account, store) = store();
        account.put_object("c", "a/snap-1", &b"1"[..]);
        account.put_object("c", "a/snap-2", &b"22"[..]);
        account.put_object("c", "a/meta-1", &b"3"[..]);

        let container = store.blob_container(&BlobPath::parse("a"));
        let blobs = container.list_blobs_by_prefix(Some("snap-")).unwrap();

        assert_eq!(blobs.keys().collect::<Vec<_>>(), vec!["snap-1", "snap-2"]);
        assert_eq!(container.list_blobs_by_prefix(Some("zzz")).unwrap().len(), 0);
    }

    #[test]
    fn root_listing_and_empty_path() {
        let (account, store) = store();
        account.put_object("c", "top", &b"t"[..]);
        account.put_object("c", "dir/inner", &b"i"[..]);

        let root = store.blob_container(&BlobPath::clean()).list_blobs().unwrap();
        assert_eq!(root.keys().collect::<Vec<_>>(), vec!["top"]);

        let empty = store.blob_container(&BlobPath::parse("nothing/here")).list_blobs().unwrap();
        assert!(empty.is_empty());
    }

    // -----------------------------------------------------------------------
    // Upload failures
    // -----------------------------------------------------------------------

    #[test]
    fn failed_upload_is_reported_on_close() {
        let (account, store) = store();
        let container = store.blob_container(&BlobPath::parse("a"));
        write_blob(&container, "blob", b"old");

        account.set_fail_uploads(true);
        let mut sink = container.create_output("blob").unwrap();
        sink.write_all(b"new").unwrap();
        let err = BlobSink::close(&mut sink).unwrap_err();

        assert!(err.to_string().contains("a/blob"));
        // The old content was removed before the upload began.
        assert!(!container.blob_exists("blob").unwrap());
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn listing_returns_exactly_the_direct_blobs(
            segments in prop::collection::vec("[a-z0-9]{1,6}", 0..3),
            direct in prop::collection::btree_set("[a-z0-9.-]{1,8}", 0..6),
            nested in prop::collection::btree_set("[a-z0-9]{1,4}/[a-z0-9]{1,4}", 0..4),
        ) {
            let (account, store) = store();
            let path = BlobPath::from_segments(&segments).unwrap();
            let container = store.blob_container(&path);

            for name in direct.iter().chain(nested.iter()) {
                account.put_object("c", &container.build_key(name), name.clone().into_bytes());
            }

            let listed = container.list_blobs().unwrap();
            let names: BTreeSet<String> = listed.keys().cloned().collect();
            prop_assert_eq!(&names, &direct);
            for (name, meta) in &listed {
                prop_assert_eq!(meta.length, name.len() as u64);
            }
        }
    }
}
