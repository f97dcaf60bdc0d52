//! OpenStack Swift client used by the snapshot repository.
//!
//! One authenticated account per process; containers and objects are
//! addressed by name within it.
//!
//! # Backends
//!
//! All backends implement the [`Account`] trait and are created through an
//! [`AccountFactory`]:
//!
//! - [`HttpAccount`] -- Swift REST API over blocking HTTP
//! - [`InMemoryAccount`] -- `HashMap`-based account for tests and embedding
//!
//! [`Container`] and [`StoredObject`] are cheap handles that bind an account
//! to a container name or an object key.

pub mod account;
pub mod auth;
pub mod error;
pub mod handle;
pub mod http;
pub mod listing;
pub mod memory;

pub use account::{Account, AccountConfig, AccountFactory, DirectoryEntry};
pub use error::{ClientError, ClientResult};
pub use handle::{Container, StoredObject};
pub use http::{HttpAccount, HttpAccountFactory};
pub use memory::{InMemoryAccount, InMemoryAccountFactory};
