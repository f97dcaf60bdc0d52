use swiftrepo_types::{BlobPath, ByteSize};
use tracing::info;

use crate::error::StoreResult;
use crate::session::SessionManager;
use crate::settings::RepositorySettings;
use crate::store::SwiftBlobStore;

/// A snapshot repository stored in one Swift container.
///
/// Construction authenticates (through the shared [`SessionManager`]) and
/// provisions the container, so a repository that exists is ready for I/O.
#[derive(Clone, Debug)]
pub struct SwiftRepository {
    name: String,
    blob_store: SwiftBlobStore,
    base_path: BlobPath,
    chunk_size: ByteSize,
    compress: bool,
}

impl SwiftRepository {
    /// Repository type name used in settings.
    pub const TYPE: &'static str = "swift";

    /// Validate `settings`, obtain the shared session and provision the
    /// container.
    pub fn new(name: &str, settings: &RepositorySettings, sessions: &SessionManager) -> StoreResult<Self> {
        settings.validate()?;
        let session = sessions.get_session(&settings.session_request())?;
        let blob_store = SwiftBlobStore::new(
            settings.buffer_size.as_usize(),
            &session,
            &settings.swift_container,
        )?;
        info!(
            repository = name,
            container = %settings.swift_container,
            chunk_size = %settings.chunk_size,
            compress = settings.compress,
            "swift repository ready"
        );
        Ok(Self {
            name: name.to_string(),
            blob_store,
            base_path: BlobPath::clean(),
            chunk_size: settings.chunk_size,
            compress: settings.compress,
        })
    }

    /// Repository name given at construction.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Store holding every blob of this repository.
    pub fn blob_store(&self) -> &SwiftBlobStore {
        &self.blob_store
    }

    /// Blobs are laid out from the root of the container.
    pub fn base_path(&self) -> &BlobPath {
        &self.base_path
    }

    /// Largest blob the snapshot writer should produce before splitting.
    pub fn chunk_size(&self) -> ByteSize {
        self.chunk_size
    }

    /// Whether snapshot metadata should be compressed.
    pub fn is_compress(&self) -> bool {
        self.compress
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use swiftrepo_client::{InMemoryAccount, InMemoryAccountFactory};

    use crate::error::BlobStoreError;

    fn settings() -> RepositorySettings {
        RepositorySettings {
            swift_url: "http://store.example/auth/v1.0".into(),
            swift_container: "snapshots".into(),
            swift_username: "u".into(),
            swift_password: "p".into(),
            swift_authmethod: "tempauth".into(),
            ..Default::default()
        }
    }

    #[test]
    fn new_repository_exposes_settings() {
        let factory = Arc::new(InMemoryAccountFactory::new(Arc::new(InMemoryAccount::new())));
        let sessions = SessionManager::new(factory.clone());

        let mut s = settings();
        s.chunk_size = ByteSize::mb(64);
        s.compress = true;
        let repo = SwiftRepository::new("backups", &s, &sessions).unwrap();

        assert_eq!(repo.name(), "backups");
        assert!(repo.base_path().is_empty());
        assert_eq!(repo.chunk_size(), ByteSize::mb(64));
        assert!(repo.is_compress());
        assert_eq!(repo.blob_store().buffer_size_in_bytes(), 100 * 1024);
        assert!(factory.account().is_public("snapshots"));
    }

    #[test]
    fn repositories_share_one_session() {
        let factory = Arc::new(InMemoryAccountFactory::new(Arc::new(InMemoryAccount::new())));
        let sessions = SessionManager::new(factory.clone());

        SwiftRepository::new("first", &settings(), &sessions).unwrap();
        let mut other = settings();
        other.swift_container = "more-snapshots".into();
        SwiftRepository::new("second", &other, &sessions).unwrap();

        assert_eq!(factory.attempts(), 1);
    }

    #[test]
    fn invalid_settings_fail_before_authenticating() {
        let factory = Arc::new(InMemoryAccountFactory::new(Arc::new(InMemoryAccount::new())));
        let sessions = SessionManager::new(factory.clone());

        let mut s = settings();
        s.swift_container.clear();
        let err = SwiftRepository::new("r", &s, &sessions).unwrap_err();

        assert!(matches!(err, BlobStoreError::Settings(_)));
        assert_eq!(factory.attempts(), 0);
    }

    #[test]
    fn rejected_credentials_are_fatal() {
        let factory = Arc::new(InMemoryAccountFactory::new(Arc::new(InMemoryAccount::new())));
        factory.set_reject(true);
        let sessions = SessionManager::new(factory.clone());

        let err = SwiftRepository::new("r", &settings(), &sessions).unwrap_err();
        assert!(matches!(err, BlobStoreError::Authentication { .. }));
    }
}
