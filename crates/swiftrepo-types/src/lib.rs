//! Foundation types for the Swift snapshot repository.
//!
//! Every other `swiftrepo` crate depends on `swiftrepo-types`.
//!
//! # Key Types
//!
//! - [`BlobPath`] -- Hierarchical blob path and its flattened key prefix
//! - [`BlobMetadata`] -- Name and length of a stored blob
//! - [`AuthMethod`] -- Closed set of Swift authentication schemes
//! - [`ByteSize`] -- Byte count parsed from settings such as `"100kb"`

pub mod auth;
pub mod error;
pub mod metadata;
pub mod path;
pub mod size;

pub use auth::AuthMethod;
pub use error::TypeError;
pub use metadata::BlobMetadata;
pub use path::BlobPath;
pub use size::ByteSize;
