//! Memoizing stream hasher
//!
//! Written files are never modified in place, so a digest stays valid for as
//! long as the file keeps its resolved path, modification time and size.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::{Stream, StreamDigest};
use crate::ports::StreamHashPort;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DigestKey {
    path: PathBuf,
    modified: SystemTime,
    size: u64,
    stream: Stream,
}

/// [`StreamHashPort`] decorator caching successful digests for the process lifetime
pub struct CachedStreamHasher {
    inner: Arc<dyn StreamHashPort>,
    digests: Mutex<HashMap<DigestKey, StreamDigest>>,
}

impl CachedStreamHasher {
    pub fn new(inner: Arc<dyn StreamHashPort>) -> Self {
        Self {
            inner,
            digests: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached digests
    pub fn len(&self) -> usize {
        self.digests.lock().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn key(file_path: &Path, stream: &Stream) -> Result<DigestKey, DomainError> {
        let path = tokio::fs::canonicalize(file_path)
            .await
            .map_err(|e| DomainError::FileNotFound(format!("{}: {}", file_path.display(), e)))?;
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| DomainError::FsFail(format!("{}: {}", path.display(), e)))?;
        let modified = metadata
            .modified()
            .map_err(|e| DomainError::FsFail(format!("{}: {}", path.display(), e)))?;

        Ok(DigestKey {
            path,
            modified,
            size: metadata.len(),
            stream: stream.clone(),
        })
    }

    fn lookup(&self, key: &DigestKey) -> Result<Option<StreamDigest>, DomainError> {
        let digests = self
            .digests
            .lock()
            .map_err(|_| DomainError::InternalError("Digest cache lock poisoned".to_string()))?;
        Ok(digests.get(key).copied())
    }
}

#[async_trait]
impl StreamHashPort for CachedStreamHasher {
    async fn stream_digest(&self, file_path: &Path, stream: &Stream) -> Result<StreamDigest, DomainError> {
        let key = Self::key(file_path, stream).await?;

        if let Some(digest) = self.lookup(&key)? {
            debug!("Digest cache hit for {} stream {}", key.path.display(), stream.index);
            return Ok(digest);
        }

        // Failures are not remembered, the next call hashes again.
        let digest = self.inner.stream_digest(&key.path, stream).await?;

        self.digests
            .lock()
            .map_err(|_| DomainError::InternalError("Digest cache lock poisoned".to_string()))?
            .insert(key, digest);
        Ok(digest)
    }
}
