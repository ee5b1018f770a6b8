//! Disk response cache.
//!
//! Raw response bodies are stored in a flat directory, one file per
//! request, named by the SHA-256 hex digest of the method path and the
//! sorted parameters. Entries never expire.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::error::{AlacartaError, Result};
use super::params::{QueryParams, form_encode};

/// Cache settings handed to the client builder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Whether cacheable calls go through the disk cache.
    pub enabled: bool,
    /// Cache directory. A temporary directory is generated when `None`.
    pub dir: Option<PathBuf>,
}

impl CacheConfig {
    /// Caching off (the default).
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            dir: None,
        }
    }

    /// Caching on, stored under `dir`.
    #[must_use]
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            dir: Some(dir.into()),
        }
    }

    /// Caching on, stored in a freshly generated temporary directory.
    #[must_use]
    pub const fn temporary() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

/// On-disk store of raw response bodies.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct ResponseCache {
    dir: PathBuf,
}

impl ResponseCache {
    /// Opens the cache, creating `dir` if needed.
    ///
    /// With `None`, a new temporary directory is created and kept after the
    /// process exits.
    ///
    /// # Errors
    ///
    /// Returns `Service` if the directory cannot be created.
    pub fn open(dir: Option<&Path>) -> Result<Self> {
        let dir = match dir {
            Some(d) => {
                fs::create_dir_all(d).map_err(|e| {
                    AlacartaError::Service(format!(
                        "failed to create cache directory {}: {e}",
                        d.display()
                    ))
                })?;
                d.to_path_buf()
            }
            None => tempfile::Builder::new()
                .prefix("alacarta-cache-")
                .tempdir()
                .map_err(|e| {
                    AlacartaError::Service(format!("failed to create temporary cache directory: {e}"))
                })?
                .keep(),
        };
        tracing::debug!(dir = %dir.display(), "Response cache opened");
        Ok(Self { dir })
    }

    /// Cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Computes the cache key for a call.
    ///
    /// Independent of the order in which `params` were inserted.
    #[must_use]
    pub fn cache_key(method: &str, params: &QueryParams) -> String {
        let mut hasher = Sha256::new();
        hasher.update(method.as_bytes());
        for (key, value) in params.sorted() {
            hasher.update(form_encode(key).as_bytes());
            hasher.update(form_encode(&value.to_string()).as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Path of the file holding `key`.
    #[must_use]
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    /// Whether a response for this call is stored.
    #[must_use]
    pub fn contains(&self, method: &str, params: &QueryParams) -> bool {
        self.entry_path(&Self::cache_key(method, params)).exists()
    }

    /// Returns the stored body, or runs `fetch`, stores its body and returns it.
    ///
    /// Nothing is written when `fetch` fails.
    ///
    /// # Errors
    ///
    /// Propagates the error of `fetch`; returns `Service` on cache I/O failure.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        method: &str,
        params: &QueryParams,
        fetch: F,
    ) -> Result<Vec<u8>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<u8>>>,
    {
        let key = Self::cache_key(method, params);
        let path = self.entry_path(&key);

        if path.exists() {
            tracing::debug!(%method, %key, "Cache hit");
        } else {
            tracing::debug!(%method, %key, "Cache miss");
            let body = fetch().await?;
            fs::write(&path, &body).map_err(|e| {
                AlacartaError::Service(format!(
                    "failed to write cache file {}: {e}",
                    path.display()
                ))
            })?;
        }

        fs::read(&path).map_err(|e| {
            AlacartaError::Service(format!("failed to read cache file {}: {e}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn test_cache_key_ignores_insertion_order() {
        // Arrange
        let a = QueryParams::new()
            .with("type", "videosprog")
            .with("id", 50338_u32)
            .with("page", 1_u32);
        let b = QueryParams::new()
            .with("page", 1_u32)
            .with("id", 50338_u32)
            .with("type", "videosprog");

        // Act & Assert
        assert_eq!(
            ResponseCache::cache_key("p3ac/p3acLlistatVideos.jsp", &a),
            ResponseCache::cache_key("p3ac/p3acLlistatVideos.jsp", &b)
        );
    }

    #[test]
    fn test_cache_key_depends_on_method_and_values() {
        // Arrange
        let params = QueryParams::new().with("lletra", "A");
        let other = QueryParams::new().with("lletra", "B");

        // Act
        let key = ResponseCache::cache_key("m1", &params);

        // Assert
        assert_ne!(key, ResponseCache::cache_key("m2", &params));
        assert_ne!(key, ResponseCache::cache_key("m1", &other));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_open_creates_missing_directory() {
        // Arrange
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("nested").join("cache");

        // Act
        let cache = ResponseCache::open(Some(&dir)).unwrap();

        // Assert
        assert!(dir.is_dir());
        assert_eq!(cache.dir(), dir.as_path());
    }

    #[test]
    fn test_open_without_dir_generates_one() {
        // Arrange & Act
        let cache = ResponseCache::open(None).unwrap();

        // Assert
        assert!(cache.dir().is_dir());
        fs::remove_dir_all(cache.dir()).unwrap();
    }

    #[tokio::test]
    async fn test_get_or_fetch_fetches_once() {
        // Arrange
        let root = tempfile::tempdir().unwrap();
        let cache = ResponseCache::open(Some(root.path())).unwrap();
        let params = QueryParams::new().with("idint", 42_u32);
        let calls = AtomicU32::new(0);

        // Act
        let mut bodies = Vec::new();
        for _ in 0..2 {
            let body = cache
                .get_or_fetch("pvideo/FLV_bbd_dadesItem.jsp", &params, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(b"<xml/>".to_vec())
                })
                .await
                .unwrap();
            bodies.push(body);
        }

        // Assert
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(bodies, vec![b"<xml/>".to_vec(), b"<xml/>".to_vec()]);
        assert!(cache.contains("pvideo/FLV_bbd_dadesItem.jsp", &params));
    }

    #[tokio::test]
    async fn test_get_or_fetch_returns_stored_bytes_unmodified() {
        // Arrange
        let root = tempfile::tempdir().unwrap();
        let cache = ResponseCache::open(Some(root.path())).unwrap();
        let params = QueryParams::new().with("a", "1");
        let key = ResponseCache::cache_key("m", &params);
        fs::write(cache.entry_path(&key), b"stale but kept").unwrap();

        // Act
        let body = cache
            .get_or_fetch("m", &params, || async { Ok(b"fresh".to_vec()) })
            .await
            .unwrap();

        // Assert
        assert_eq!(body, b"stale but kept".to_vec());
    }

    #[tokio::test]
    async fn test_failed_fetch_writes_nothing() {
        // Arrange
        let root = tempfile::tempdir().unwrap();
        let cache = ResponseCache::open(Some(root.path())).unwrap();
        let params = QueryParams::new().with("a", "1");

        // Act
        let result = cache
            .get_or_fetch("m", &params, || async {
                Err(AlacartaError::Connection(String::from("HTTP 500")))
            })
            .await;

        // Assert
        assert!(matches!(result, Err(AlacartaError::Connection(_))));
        assert!(!cache.contains("m", &params));
    }
}
