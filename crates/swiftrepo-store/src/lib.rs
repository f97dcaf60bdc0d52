//! Snapshot blob storage on OpenStack Swift.
//!
//! This crate maps a hierarchical blob namespace onto one flat Swift
//! container. A blob named `snap-1` in the container for path
//! `indices/idx/0` is stored under the object key `indices/idx/0/snap-1`.
//!
//! # Components
//!
//! - [`SessionManager`] -- authenticates once per process and caches the session
//! - [`SwiftBlobStore`] -- owns the provisioned Swift container
//! - [`SwiftBlobContainer`] -- blob operations scoped to one [`BlobPath`]
//! - [`UploadSink`] -- streaming write path (pipe plus worker thread)
//! - [`SwiftRepository`] -- settings-driven entry point
//!
//! # Rules
//!
//! 1. Listing is non-recursive; grouped sub-directories are not blobs.
//! 2. Deleting something absent succeeds.
//! 3. A written blob exists only after its sink closed successfully, and a
//!    failed upload is reported by that close.
//! 4. There are no retries and no token renewal in this layer.
//!
//! [`BlobPath`]: swiftrepo_types::BlobPath

pub mod container;
pub mod error;
pub mod repository;
pub mod session;
pub mod settings;
pub mod store;
pub mod traits;
pub mod upload;

pub use container::SwiftBlobContainer;
pub use error::{BlobStoreError, StoreResult};
pub use repository::SwiftRepository;
pub use session::{Session, SessionManager, SessionRequest};
pub use settings::RepositorySettings;
pub use store::{SwiftBlobStore, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};
pub use traits::{BlobContainer, BlobMap, BlobSink, BlobStore};
pub use upload::{UploadSink, UploadState};
