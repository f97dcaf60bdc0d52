use serde::{Deserialize, Serialize};

/// Name and content length of a stored blob.
///
/// `name` is relative to the container adapter that listed it, never the full
/// object key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub name: String,
    pub length: u64,
}

impl BlobMetadata {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_fields() {
        let meta = BlobMetadata::new("index-1", 3);
        assert_eq!(meta.name, "index-1");
        assert_eq!(meta.length, 3);
    }
}
