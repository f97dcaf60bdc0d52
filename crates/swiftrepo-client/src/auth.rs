//! Swift authentication handshakes.
//!
//! - TempAuth: `GET <auth_url>` with `X-Storage-User` / `X-Storage-Pass`.
//! - Basic: `GET <auth_url>` with an HTTP basic `Authorization` header.
//! - Keystone v2.0: `POST <auth_url>/tokens` with password credentials; the
//!   storage URL comes from the `object-store` entry of the service catalog.
//!
//! TempAuth and Basic both answer with `X-Storage-Url` and `X-Auth-Token`.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use swiftrepo_types::AuthMethod;
use tracing::debug;
use url::Url;

use crate::account::AccountConfig;
use crate::error::{ClientError, ClientResult};

pub const STORAGE_URL_HEADER: &str = "X-Storage-Url";
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
const OBJECT_STORE_SERVICE: &str = "object-store";

/// Result of a successful handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessInfo {
    pub storage_url: Url,
    pub token: String,
}

impl std::fmt::Debug for AccessInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessInfo")
            .field("storage_url", &self.storage_url.as_str())
            .field("token", &"<redacted>")
            .finish()
    }
}

pub fn authenticate(client: &Client, config: &AccountConfig) -> ClientResult<AccessInfo> {
    debug!(url = %config.auth_url, method = %config.method, "authenticating");
    match &config.method {
        AuthMethod::TempAuth => {
            let response = client
                .get(&config.auth_url)
                .header("X-Storage-User", &config.username)
                .header("X-Storage-Pass", &config.password)
                .send()?;
            access_from_headers(check_auth_status(response)?)
        }
        AuthMethod::Basic => {
            let response = client
                .get(&config.auth_url)
                .header(
                    reqwest::header::AUTHORIZATION,
                    basic_authorization(&config.username, &config.password),
                )
                .send()?;
            access_from_headers(check_auth_status(response)?)
        }
        AuthMethod::Keystone { tenant_name, tenant_id } => {
            let body = keystone_request_body(&config.username, &config.password, tenant_name, tenant_id);
            let response = client
                .post(keystone_token_url(&config.auth_url)?)
                .json(&body)
                .send()?;
            let bytes = check_auth_status(response)?.bytes()?;
            parse_keystone_access(&bytes)
        }
    }
}

fn check_auth_status(response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Authentication(format!(
            "{} answered HTTP {}",
            response.url(),
            status.as_u16()
        )))
    }
}

fn access_from_headers(response: Response) -> ClientResult<AccessInfo> {
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ClientError::Authentication(format!("response lacks {name} header")))
    };
    let storage_url = header(STORAGE_URL_HEADER)?;
    let token = header(AUTH_TOKEN_HEADER)?;
    Ok(AccessInfo {
        storage_url: parse_storage_url(&storage_url)?,
        token,
    })
}

fn parse_storage_url(raw: &str) -> ClientResult<Url> {
    Url::parse(raw).map_err(|e| ClientError::InvalidUrl(format!("{raw}: {e}")))
}

pub fn basic_authorization(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{username}:{password}")))
}

/// The tokens endpoint for a Keystone auth URL. Accepts both
/// `.../v2.0` and `.../v2.0/tokens`.
pub fn keystone_token_url(auth_url: &str) -> ClientResult<Url> {
    let mut url = parse_storage_url(auth_url)?;
    let already_tokens = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .is_some_and(|last| last == "tokens");
    if !already_tokens {
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(auth_url.to_string()))?
            .pop_if_empty()
            .push("tokens");
    }
    Ok(url)
}

pub fn keystone_request_body(username: &str, password: &str, tenant_name: &str, tenant_id: &str) -> Value {
    let mut auth = json!({
        "passwordCredentials": {
            "username": username,
            "password": password,
        }
    });
    if !tenant_name.is_empty() {
        auth["tenantName"] = json!(tenant_name);
    }
    if !tenant_id.is_empty() {
        auth["tenantId"] = json!(tenant_id);
    }
    json!({ "auth": auth })
}

#[derive(Deserialize)]
struct KeystoneResponse {
    access: KeystoneAccess,
}

#[derive(Deserialize)]
struct KeystoneAccess {
    token: KeystoneToken,
    #[serde(rename = "serviceCatalog", default)]
    service_catalog: Vec<KeystoneService>,
}

#[derive(Deserialize)]
struct KeystoneToken {
    id: String,
}

#[derive(Deserialize)]
struct KeystoneService {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    endpoints: Vec<KeystoneEndpoint>,
}

#[derive(Deserialize)]
struct KeystoneEndpoint {
    #[serde(rename = "publicURL")]
    public_url: String,
}

pub fn parse_keystone_access(body: &[u8]) -> ClientResult<AccessInfo> {
    let response: KeystoneResponse = serde_json::from_slice(body)
        .map_err(|e| ClientError::MalformedResponse(format!("keystone token response: {e}")))?;
    let endpoint = response
        .access
        .service_catalog
        .iter()
        .filter(|service| service.kind == OBJECT_STORE_SERVICE)
        .flat_map(|service| service.endpoints.iter())
        .next()
        .ok_or_else(|| {
            ClientError::Authentication("service catalog has no object-store endpoint".into())
        })?;
    Ok(AccessInfo {
        storage_url: parse_storage_url(&endpoint.public_url)?,
        token: response.access.token.id,
    })
}
