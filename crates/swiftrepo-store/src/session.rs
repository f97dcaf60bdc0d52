//! Process-wide Swift session.
//!
//! A [`SessionManager`] authenticates on first use and hands the same
//! [`Session`] to every later caller. Create one manager per process and pass
//! it to whatever needs a session; there is no hidden global.
//!
//! Requests for a different endpoint or user after the session exists still
//! receive the cached session. The mismatch is logged, not rejected.

use std::fmt;
use std::sync::{Arc, Mutex};

use swiftrepo_client::{Account, AccountConfig, AccountFactory, Container, HttpAccountFactory};
use swiftrepo_types::AuthMethod;
use tracing::{info, warn};

use crate::error::{BlobStoreError, StoreResult};

/// Connection parameters as they appear in repository settings.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionRequest {
    pub url: String,
    pub username: String,
    pub password: String,
    pub tenant_name: String,
    pub tenant_id: String,
    /// `keystone`, `tempauth` or `basic` in any case; anything else is basic.
    pub auth_method: String,
}

impl SessionRequest {
    /// The normalized authentication scheme for this request.
    pub fn auth_method(&self) -> AuthMethod {
        AuthMethod::from_setting(&self.auth_method, &self.tenant_name, &self.tenant_id)
    }

    /// Client configuration carrying these credentials.
    pub fn account_config(&self) -> AccountConfig {
        AccountConfig {
            auth_url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            method: self.auth_method(),
        }
    }
}

impl fmt::Debug for SessionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRequest")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("tenant_name", &self.tenant_name)
            .field("tenant_id", &self.tenant_id)
            .field("auth_method", &self.auth_method)
            .finish()
    }
}

/// An authenticated account handle. Immutable; clones share the account.
#[derive(Clone)]
pub struct Session {
    account: Arc<dyn Account>,
    url: String,
    username: String,
    method: AuthMethod,
}

impl Session {
    /// The authenticated account shared by every clone of this session.
    pub fn account(&self) -> &Arc<dyn Account> {
        &self.account
    }

    /// Authentication endpoint the session was opened against.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// User the session was opened for.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Scheme used to authenticate.
    pub fn auth_method(&self) -> &AuthMethod {
        &self.method
    }

    /// Handle to a container of this account. No I/O.
    pub fn container(&self, name: &str) -> Container {
        Container::new(Arc::clone(&self.account), name)
    }

    /// Whether both sessions share the same authenticated account.
    pub fn ptr_eq(&self, other: &Session) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.account), Arc::as_ptr(&other.account))
    }

    fn matches(&self, request: &SessionRequest) -> bool {
        self.url == request.url
            && self.username == request.username
            && self.method == request.auth_method()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("method", &self.method)
            .finish()
    }
}

/// Lazily authenticated, never invalidated session cell.
pub struct SessionManager {
    factory: Arc<dyn AccountFactory>,
    session: Mutex<Option<Session>>,
}

impl SessionManager {
    /// Manager that opens its session through `factory`.
    pub fn new(factory: Arc<dyn AccountFactory>) -> Self {
        Self {
            factory,
            session: Mutex::new(None),
        }
    }

    /// Manager that authenticates against Swift over HTTP.
    pub fn http() -> StoreResult<Self> {
        let factory = HttpAccountFactory::new().map_err(|e| BlobStoreError::Io {
            op: "http_client",
            key: String::new(),
            source: std::io::Error::other(e),
        })?;
        Ok(Self::new(Arc::new(factory)))
    }

    /// Return the cached session, authenticating first if there is none.
    ///
    /// The lock is held for the whole authentication, so concurrent callers
    /// cause at most one attempt. A failed attempt leaves the cell empty.
    pub fn get_session(&self, request: &SessionRequest) -> StoreResult<Session> {
        let mut cell = self.session.lock().expect("lock poisoned");
        if let Some(session) = cell.as_ref() {
            if !session.matches(request) {
                warn!(
                    cached_url = %session.url,
                    cached_user = %session.username,
                    requested_url = %request.url,
                    requested_user = %request.username,
                    "reusing existing swift session for a different endpoint or user"
                );
            }
            return Ok(session.clone());
        }

        let config = request.account_config();
        let account = self
            .factory
            .create_account(&config)
            .map_err(|source| BlobStoreError::Authentication {
                method: config.method.display_name(),
                endpoint: config.auth_url.clone(),
                source,
            })?;

        let session = Session {
            account,
            url: config.auth_url,
            username: config.username,
            method: config.method,
        };
        info!(url = %session.url, method = %session.method, "swift session established");
        *cell = Some(session.clone());
        Ok(session)
    }

    /// The cached session, if any. Never authenticates.
    pub fn current(&self) -> Option<Session> {
        self.session.lock().expect("lock poisoned").clone()
    }

    /// Sessions live for the whole process; closing releases nothing.
    pub fn close(&self) {}
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("session", &self.current())
            .finish()
    }
}
