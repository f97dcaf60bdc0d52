use std::io::Read;
use std::sync::Arc;

use reqwest::blocking::{Body, Client, RequestBuilder, Response};
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Method, StatusCode};
use tracing::{debug, info};
use url::Url;

use crate::account::{Account, AccountConfig, AccountFactory, DirectoryEntry};
use crate::auth::{self, AccessInfo, AUTH_TOKEN_HEADER};
use crate::error::{ClientError, ClientResult};
use crate::listing::{self, PAGE_LIMIT};

/// ACL granting anonymous reads and listings.
pub const PUBLIC_READ_ACL: &str = ".r:*,.rlistings";

/// Authenticates against Swift over HTTP.
pub struct HttpAccountFactory {
    client: Client,
}

impl HttpAccountFactory {
    /// Factory with a default client. Requests never time out on their own;
    /// uploads last as long as the producer keeps writing.
    pub fn new() -> ClientResult<Self> {
        let client = Client::builder().timeout(None).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl AccountFactory for HttpAccountFactory {
    fn create_account(&self, config: &AccountConfig) -> ClientResult<Arc<dyn Account>> {
        let access = auth::authenticate(&self.client, config)?;
        info!(storage_url = %access.storage_url, method = %config.method, "swift account ready");
        Ok(Arc::new(HttpAccount::new(self.client.clone(), access)))
    }
}

/// A Swift account reached through its storage URL.
///
/// Nothing is cached: every call is one request against the cluster.
pub struct HttpAccount {
    client: Client,
    access: AccessInfo,
}

impl HttpAccount {
    pub fn new(client: Client, access: AccessInfo) -> Self {
        Self { client, access }
    }

    pub fn storage_url(&self) -> &Url {
        &self.access.storage_url
    }

    /// `<storage_url>/<container>/<key>`; an empty key addresses the container.
    ///
    /// URL parsing resolves `.` and `..` path segments, so a container name
    /// or key containing one would address a different resource. Such names
    /// are rejected with [`ClientError::InvalidUrl`].
    pub fn object_url(&self, container: &str, key: &str) -> ClientResult<Url> {
        if is_dot_segment(container) || (!key.is_empty() && key.split('/').any(is_dot_segment)) {
            return Err(ClientError::InvalidUrl(format!(
                "dot segment in object path {container}/{key}"
            )));
        }
        let mut url = self.access.storage_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl(self.access.storage_url.to_string()))?;
            segments.pop_if_empty().push(container);
            if !key.is_empty() {
                segments.extend(key.split('/'));
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(AUTH_TOKEN_HEADER, &self.access.token)
    }

    fn send(&self, method: Method, url: Url, what: &str) -> ClientResult<Response> {
        let response = self.request(method.clone(), url).send()?;
        check_status(response, method, what)
    }

    /// `HEAD` returning `None` on 404.
    fn head(&self, url: Url, what: &str) -> ClientResult<Option<Response>> {
        match self.send(Method::HEAD, url, what) {
            Ok(response) => Ok(Some(response)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn list_page(
        &self,
        container: &str,
        prefix: &str,
        delimiter: char,
        marker: Option<&str>,
    ) -> ClientResult<Vec<DirectoryEntry>> {
        let mut url = self.object_url(container, "")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("format", "json")
                .append_pair("limit", &PAGE_LIMIT.to_string())
                .append_pair("delimiter", &delimiter.to_string());
            if !prefix.is_empty() {
                query.append_pair("prefix", prefix);
            }
            if let Some(marker) = marker {
                query.append_pair("marker", marker);
            }
        }
        let response = self.send(Method::GET, url, &format!("container {container}"))?;
        listing::parse_page(&response.bytes()?)
    }
}

fn is_dot_segment(segment: &str) -> bool {
    segment == "." || segment == ".."
}

fn check_status(response: Response, method: Method, what: &str) -> ClientResult<Response> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(what.to_string()));
    }
    if !status.is_success() {
        let url = response.url().to_string();
        let message = response.text().unwrap_or_default();
        return Err(ClientError::Http {
            method: method.to_string(),
            url,
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

impl Account for HttpAccount {
    fn container_exists(&self, container: &str) -> ClientResult<bool> {
        let url = self.object_url(container, "")?;
        Ok(self.head(url, &format!("container {container}"))?.is_some())
    }

    fn create_container(&self, container: &str) -> ClientResult<()> {
        let url = self.object_url(container, "")?;
        self.send(Method::PUT, url, &format!("container {container}"))?;
        debug!(container, "container created");
        Ok(())
    }

    fn make_public(&self, container: &str) -> ClientResult<()> {
        let url = self.object_url(container, "")?;
        let response = self
            .request(Method::POST, url)
            .header("X-Container-Read", PUBLIC_READ_ACL)
            .send()?;
        check_status(response, Method::POST, &format!("container {container}"))?;
        Ok(())
    }

    fn object_exists(&self, container: &str, key: &str) -> ClientResult<bool> {
        let url = self.object_url(container, key)?;
        Ok(self.head(url, &format!("{container}/{key}"))?.is_some())
    }

    fn object_length(&self, container: &str, key: &str) -> ClientResult<u64> {
        let what = format!("{container}/{key}");
        let url = self.object_url(container, key)?;
        let response = self.send(Method::HEAD, url, &what)?;
        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .ok_or_else(|| ClientError::MalformedResponse(format!("{what}: missing Content-Length")))
    }

    fn delete_object(&self, container: &str, key: &str) -> ClientResult<()> {
        let url = self.object_url(container, key)?;
        self.send(Method::DELETE, url, &format!("{container}/{key}"))?;
        Ok(())
    }

    fn download(&self, container: &str, key: &str) -> ClientResult<Box<dyn Read + Send>> {
        let url = self.object_url(container, key)?;
        let response = self.send(Method::GET, url, &format!("{container}/{key}"))?;
        Ok(Box::new(response))
    }

    fn upload(&self, container: &str, key: &str, source: Box<dyn Read + Send>) -> ClientResult<()> {
        let url = self.object_url(container, key)?;
        // No length is known up front, so the body goes out chunked.
        let response = self.request(Method::PUT, url).body(Body::new(source)).send()?;
        check_status(response, Method::PUT, &format!("{container}/{key}"))?;
        debug!(container, key, "object uploaded");
        Ok(())
    }

    fn list_directory(
        &self,
        container: &str,
        prefix: &str,
        delimiter: char,
    ) -> ClientResult<Vec<DirectoryEntry>> {
        let mut entries = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let page = self.list_page(container, prefix, delimiter, marker.as_deref())?;
            let full = page.len() >= PAGE_LIMIT;
            marker = page.last().map(|entry| entry.name().to_string());
            entries.extend(page);
            if !full {
                break;
            }
        }
        Ok(entries)
    }
}

impl std::fmt::Debug for HttpAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAccount")
            .field("storage_url", &self.access.storage_url.as_str())
            .finish()
    }
}
