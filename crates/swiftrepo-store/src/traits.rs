use std::collections::BTreeMap;
use std::io::{self, Read, Write};

use swiftrepo_types::{BlobMetadata, BlobPath};

use crate::error::StoreResult;

/// Blobs of one container, keyed by name relative to the container's path.
pub type BlobMap = BTreeMap<String, BlobMetadata>;

/// A write stream for a single blob.
///
/// Bytes are not guaranteed to be stored until [`BlobSink::close`] returns
/// `Ok`. Close exactly once.
pub trait BlobSink: Write + Send {
    fn close(&mut self) -> io::Result<()>;
}

/// Blob operations scoped to one [`BlobPath`].
///
/// Implementations must satisfy:
/// - Deleting a missing blob succeeds.
/// - Listing a path without blobs yields an empty map, never an error.
/// - Writing a blob replaces any previous content under the same name.
pub trait BlobContainer: Send + Sync {
    type Input: Read + Send;
    type Output: BlobSink;

    /// The path this container is bound to.
    fn path(&self) -> &BlobPath;

    fn blob_exists(&self, blob_name: &str) -> StoreResult<bool>;

    /// Delete a blob if present. Returns `true` whether or not it existed.
    fn delete_blob(&self, blob_name: &str) -> StoreResult<bool>;

    /// Blobs directly under this path whose names start with `blob_prefix`.
    fn list_blobs_by_prefix(&self, blob_prefix: Option<&str>) -> StoreResult<BlobMap>;

    fn list_blobs(&self) -> StoreResult<BlobMap> {
        self.list_blobs_by_prefix(None)
    }

    fn open_input(&self, blob_name: &str) -> StoreResult<Self::Input>;

    fn create_output(&self, blob_name: &str) -> StoreResult<Self::Output>;
}

/// Factory for path-scoped blob containers.
pub trait BlobStore: Send + Sync {
    type Container: BlobContainer;

    fn blob_container(&self, path: &BlobPath) -> Self::Container;

    /// Delete the single object addressed by `path` itself.
    fn delete(&self, path: &BlobPath) -> StoreResult<()>;

    fn close(&self) -> StoreResult<()>;
}
