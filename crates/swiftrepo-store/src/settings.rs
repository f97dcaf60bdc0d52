use std::fmt;

use serde::{Deserialize, Serialize};
use swiftrepo_types::ByteSize;

use crate::error::{BlobStoreError, StoreResult};
use crate::session::SessionRequest;
use crate::store::MAX_BUFFER_SIZE;

/// Settings of one Swift-backed repository.
///
/// Every field is optional when deserializing; [`RepositorySettings::validate`]
/// enforces the two that are required.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepositorySettings {
    pub swift_url: String,
    pub swift_container: String,
    pub swift_username: String,
    pub swift_password: String,
    pub swift_tenantname: String,
    pub swift_tenantid: String,
    pub swift_authmethod: String,
    pub buffer_size: ByteSize,
    pub chunk_size: ByteSize,
    pub compress: bool,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            swift_url: String::new(),
            swift_container: String::new(),
            swift_username: String::new(),
            swift_password: String::new(),
            swift_tenantname: String::new(),
            swift_tenantid: String::new(),
            swift_authmethod: String::new(),
            buffer_size: ByteSize::kb(100),
            chunk_size: ByteSize::gb(5),
            compress: false,
        }
    }
}

impl RepositorySettings {
    /// Parse and validate settings from TOML.
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        let settings: Self =
            toml::from_str(s).map_err(|e| BlobStoreError::Settings(e.message().to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check required fields and size bounds.
    pub fn validate(&self) -> StoreResult<()> {
        if self.swift_url.trim().is_empty() {
            return Err(BlobStoreError::Settings("no swift_url defined for swift repository".into()));
        }
        if self.swift_container.trim().is_empty() {
            return Err(BlobStoreError::Settings(
                "no swift_container defined for swift repository".into(),
            ));
        }
        let buffer_size = self.buffer_size.as_u64();
        if buffer_size == 0 || buffer_size > MAX_BUFFER_SIZE as u64 {
            return Err(BlobStoreError::Settings(format!(
                "buffer_size {} must be between 1b and {}",
                self.buffer_size,
                ByteSize::b(MAX_BUFFER_SIZE as u64)
            )));
        }
        Ok(())
    }

    /// Connection parameters for the [`crate::SessionManager`].
    pub fn session_request(&self) -> SessionRequest {
        SessionRequest {
            url: self.swift_url.clone(),
            username: self.swift_username.clone(),
            password: self.swift_password.clone(),
            tenant_name: self.swift_tenantname.clone(),
            tenant_id: self.swift_tenantid.clone(),
            auth_method: self.swift_authmethod.clone(),
        }
    }
}

impl fmt::Debug for RepositorySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositorySettings")
            .field("swift_url", &self.swift_url)
            .field("swift_container", &self.swift_container)
            .field("swift_username", &self.swift_username)
            .field("swift_password", &"<redacted>")
            .field("swift_tenantname", &self.swift_tenantname)
            .field("swift_tenantid", &self.swift_tenantid)
            .field("swift_authmethod", &self.swift_authmethod)
            .field("buffer_size", &self.buffer_size)
            .field("chunk_size", &self.chunk_size)
            .field("compress", &self.compress)
            .finish()
    }
}
