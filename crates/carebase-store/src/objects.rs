//! Local-disk implementation of `ObjectStore`.
//!
//! Objects land in `<root>/<bucket>/<name>` and are addressed publicly as
//! `<public_base_url>/<bucket>/<name>`. The HTTP layer serves `root`
//! read-only under that base URL.

use std::path::{Path, PathBuf};

use tracing::info;

use carebase_contracts::error::{CarebaseError, CarebaseResult};
use carebase_core::traits::ObjectStore;

pub struct LocalObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// A single path component: no separators, no parent references.
fn check_segment(kind: &str, segment: &str) -> CarebaseResult<()> {
    if segment.is_empty()
        || segment.contains('/')
        || segment.contains('\\')
        || segment.contains("..")
    {
        return Err(CarebaseError::ObjectStore {
            reason: format!("invalid {kind} name '{segment}'"),
        });
    }
    Ok(())
}

impl ObjectStore for LocalObjectStore {
    fn put(
        &self,
        bucket: &str,
        name: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> CarebaseResult<String> {
        check_segment("bucket", bucket)?;
        check_segment("object", name)?;

        let dir = self.root.join(bucket);
        std::fs::create_dir_all(&dir).map_err(|e| CarebaseError::ObjectStore {
            reason: format!("failed to create bucket directory '{}': {}", dir.display(), e),
        })?;

        let path = dir.join(name);
        std::fs::write(&path, bytes).map_err(|e| CarebaseError::ObjectStore {
            reason: format!("failed to write '{}': {}", path.display(), e),
        })?;

        info!(
            bucket = %bucket,
            object = %name,
            size = bytes.len(),
            content_type = content_type.unwrap_or("application/octet-stream"),
            "object stored"
        );

        Ok(format!("{}/{}/{}", self.public_base_url, bucket, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_writes_file_and_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "http://localhost:8000/files/");

        let url = store.put("avatars", "u1_abc.png", b"png-bytes", Some("image/png")).unwrap();

        assert_eq!(url, "http://localhost:8000/files/avatars/u1_abc.png");
        let written = std::fs::read(dir.path().join("avatars").join("u1_abc.png")).unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[test]
    fn put_overwrites_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "http://x");

        store.put("prescriptions", "rx.pdf", b"one", None).unwrap();
        store.put("prescriptions", "rx.pdf", b"two", None).unwrap();

        assert_eq!(std::fs::read(dir.path().join("prescriptions/rx.pdf")).unwrap(), b"two");
    }

    #[test]
    fn traversal_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "http://x");

        for (bucket, name) in [
            ("avatars", "../escape.png"),
            ("avatars", "nested/file.png"),
            ("avatars", "back\\slash.png"),
            ("..", "file.png"),
            ("", "file.png"),
            ("avatars", ""),
        ] {
            let result = store.put(bucket, name, b"x", None);
            assert!(
                matches!(result, Err(CarebaseError::ObjectStore { .. })),
                "accepted {bucket:?}/{name:?}"
            );
        }
    }
}
