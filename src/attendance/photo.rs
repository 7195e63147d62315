use actix_web::web;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Public path segment the upload directory is served under.
const PUBLIC_SEGMENT: &str = "uploads";

#[derive(Debug, Clone)]
pub struct StoredPhoto {
    pub path: PathBuf,
    pub url: String,
}

/// Attendance photo evidence on the local filesystem.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
    public_base_url: String,
}

impl PhotoStore {
    /// Creates the upload directory if needed.
    pub fn open(dir: impl Into<PathBuf>, public_base_url: &str) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the photo under a unique name derived from `original_name`.
    pub async fn save(&self, original_name: Option<&str>, bytes: Vec<u8>) -> io::Result<StoredPhoto> {
        let stored_name = format!(
            "{}_{}",
            Uuid::new_v4().to_simple(),
            safe_file_name(original_name.unwrap_or_default())
        );
        let path = self.dir.join(&stored_name);

        let target = path.clone();
        web::block(move || std::fs::write(target, bytes))
            .await
            .map_err(io::Error::other)??;

        Ok(StoredPhoto {
            url: format!("{}/{}/{}", self.public_base_url, PUBLIC_SEGMENT, stored_name),
            path,
        })
    }

    /// Best-effort removal of a photo whose attendance write did not happen.
    pub async fn discard(&self, photo: &StoredPhoto) {
        let path = photo.path.clone();
        let outcome = web::block(move || std::fs::remove_file(path)).await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(error = %e, path = %photo.path.display(), "Failed to discard photo")
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %photo.path.display(), "Failed to discard photo")
            }
        }
    }
}

/// Basename of the client filename with anything outside `[A-Za-z0-9._-]`
/// replaced, so the name can never leave the upload directory.
pub fn safe_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim_start_matches('.');

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "photo".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> PhotoStore {
        let dir = std::env::temp_dir().join(format!("attendance-photos-{}", Uuid::new_v4()));
        PhotoStore::open(dir, "http://127.0.0.1:8000/").unwrap()
    }

    #[test]
    fn file_names_cannot_escape_the_upload_dir() {
        assert_eq!(safe_file_name("../../etc/passwd"), "passwd");
        assert_eq!(safe_file_name("C:\\Users\\me\\face.png"), "face.png");
        assert_eq!(safe_file_name("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(safe_file_name(".."), "photo");
        assert_eq!(safe_file_name(""), "photo");
    }

    #[actix_web::test]
    async fn save_writes_bytes_and_builds_public_url() {
        let store = temp_store();

        let photo = store.save(Some("in.jpg"), b"jpeg-bytes".to_vec()).await.unwrap();

        assert_eq!(std::fs::read(&photo.path).unwrap(), b"jpeg-bytes");
        assert!(photo.path.starts_with(store.dir()));
        assert!(photo.url.starts_with("http://127.0.0.1:8000/uploads/"));
        assert!(photo.url.ends_with("_in.jpg"));

        std::fs::remove_dir_all(store.dir()).unwrap();
    }

    #[actix_web::test]
    async fn same_file_name_does_not_overwrite() {
        let store = temp_store();

        let first = store.save(Some("face.jpg"), b"one".to_vec()).await.unwrap();
        let second = store.save(Some("face.jpg"), b"two".to_vec()).await.unwrap();

        assert_ne!(first.path, second.path);
        assert_eq!(std::fs::read(&first.path).unwrap(), b"one");

        std::fs::remove_dir_all(store.dir()).unwrap();
    }

    #[actix_web::test]
    async fn discard_removes_the_file() {
        let store = temp_store();
        let photo = store.save(None, b"x".to_vec()).await.unwrap();

        store.discard(&photo).await;

        assert!(!photo.path.exists());
        std::fs::remove_dir_all(store.dir()).unwrap();
    }
}
