//! Container listing pages as returned by `GET /<container>?format=json`.

use serde::Deserialize;

use crate::account::DirectoryEntry;
use crate::error::{ClientError, ClientResult};

/// Maximum number of entries Swift returns per listing request.
pub const PAGE_LIMIT: usize = 10_000;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Subdir { subdir: String },
    Object { name: String, bytes: u64 },
}

/// Decode one JSON listing page. An empty body (HTTP 204) is an empty page.
pub fn parse_page(body: &[u8]) -> ClientResult<Vec<DirectoryEntry>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let raw: Vec<RawEntry> = serde_json::from_slice(body)
        .map_err(|e| ClientError::MalformedResponse(format!("container listing: {e}")))?;
    Ok(raw
        .into_iter()
        .map(|entry| match entry {
            RawEntry::Subdir { subdir } => DirectoryEntry::Directory { name: subdir },
            RawEntry::Object { name, bytes } => DirectoryEntry::Object {
                name,
                content_length: bytes,
            },
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_objects_and_subdirs() {
        let body = br#"[
            {"subdir": "a/b/"},
            {"name": "a/x", "bytes": 3, "hash": "900150983cd24fb0d6963f7d28e17f72",
             "content_type": "application/octet-stream", "last_modified": "2024-01-01T00:00:00.000000"},
            {"name": "a/y", "bytes": 0, "hash": "d41d8cd98f00b204e9800998ecf8427e",
             "content_type": "application/octet-stream", "last_modified": "2024-01-01T00:00:00.000000"}
        ]"#;
        let entries = parse_page(body).unwrap();
        assert_eq!(
            entries,
            vec![
                DirectoryEntry::Directory { name: "a/b/".into() },
                DirectoryEntry::Object { name: "a/x".into(), content_length: 3 },
                DirectoryEntry::Object { name: "a/y".into(), content_length: 0 },
            ]
        );
    }

    #[test]
    fn empty_body_is_empty_page() {
        assert!(parse_page(b"").unwrap().is_empty());
        assert!(parse_page(b"  \n").unwrap().is_empty());
        assert!(parse_page(b"[]").unwrap().is_empty());
    }

    #[test]
    fn garbage_is_malformed() {
        let err = parse_page(b"<html>nope</html>").unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
    }
}
