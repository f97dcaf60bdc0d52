use std::fmt;

use swiftrepo_client::{ClientError, Container};
use swiftrepo_types::BlobPath;
use tracing::{debug, info};

use crate::container::SwiftBlobContainer;
use crate::error::{BlobStoreError, StoreResult};
use crate::session::Session;
use crate::traits::BlobStore;

/// Read buffer size used when none is configured.
pub const DEFAULT_BUFFER_SIZE: usize = 100 * 1024;

/// Largest read buffer a store allocates per open blob.
pub const MAX_BUFFER_SIZE: usize = 64 * 1024 * 1024;

/// Blob store backed by a single Swift container.
///
/// The container is provisioned once, at construction. Cloning is cheap and
/// clones share the session's account.
#[derive(Clone)]
pub struct SwiftBlobStore {
    buffer_size: usize,
    container: Container,
}

impl SwiftBlobStore {
    /// Bind to `container_name`, creating it and granting public read access
    /// when it does not exist yet.
    ///
    /// `buffer_size_in_bytes` is clamped to `1..=MAX_BUFFER_SIZE`.
    pub fn new(buffer_size_in_bytes: usize, session: &Session, container_name: &str) -> StoreResult<Self> {
        let container = session.container(container_name);
        let provision_err = |source: ClientError| BlobStoreError::ContainerProvision {
            container: container_name.to_string(),
            source,
        };

        if !container.exists().map_err(provision_err)? {
            container.create().map_err(provision_err)?;
            container.make_public().map_err(provision_err)?;
            info!(container = container_name, "created public swift container");
        } else {
            debug!(container = container_name, "using existing swift container");
        }

        Ok(Self {
            buffer_size: buffer_size_in_bytes.clamp(1, MAX_BUFFER_SIZE),
            container,
        })
    }

    /// Handle to the provisioned Swift container.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Read buffer size for blob inputs.
    pub fn buffer_size_in_bytes(&self) -> usize {
        self.buffer_size
    }
}

impl BlobStore for SwiftBlobStore {
    type Container = SwiftBlobContainer;

    fn blob_container(&self, path: &BlobPath) -> SwiftBlobContainer {
        SwiftBlobContainer::new(path.clone(), self.clone())
    }

    fn delete(&self, path: &BlobPath) -> StoreResult<()> {
        let key = path.key_prefix();
        if key.is_empty() {
            return Ok(());
        }
        let object = self.container.object(key.as_str());
        let exists = object
            .exists()
            .map_err(|e| BlobStoreError::remote("delete", &key, e))?;
        if exists {
            match object.delete() {
                Ok(()) => debug!(key = %key, "deleted path object"),
                // Gone between the check and the delete.
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(BlobStoreError::remote("delete", &key, e)),
            }
        }
        Ok(())
    }

    fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}

impl fmt::Debug for SwiftBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwiftBlobStore")
            .field("container", &self.container.name())
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}
