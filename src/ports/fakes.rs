// In-memory port implementations for unit tests

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::*;

/// Digest made of one repeated byte
pub fn digest(byte: u8) -> StreamDigest {
    StreamDigest::new([byte; 16])
}

/// Hasher answering from a table keyed by (file name, stream index)
#[derive(Default)]
pub struct FakeHasher {
    digests: HashMap<(String, usize), StreamDigest>,
    pub calls: AtomicUsize,
}

impl FakeHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, file_name: &str, stream_index: usize, byte: u8) -> Self {
        self.digests
            .insert((file_name.to_string(), stream_index), digest(byte));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamHashPort for FakeHasher {
    async fn stream_digest(&self, file_path: &Path, stream: &Stream) -> Result<StreamDigest, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.digests
            .get(&(name.clone(), stream.index))
            .copied()
            .ok_or_else(|| DomainError::HashFail(format!("no digest for {} stream {}", name, stream.index)))
    }
}

/// Transcoder that records its invocations without running anything
#[derive(Default)]
pub struct FakeTranscoder {
    pub encoders: Vec<String>,
    pub encoder_query_fails: bool,
    pub invocations: Mutex<Vec<Vec<String>>>,
}

impl FakeTranscoder {
    pub fn with_encoders(encoders: &[&str]) -> Self {
        Self {
            encoders: encoders.iter().map(|e| e.to_string()).collect(),
            ..Self::default()
        }
    }

    /// A transcoder whose encoder listing cannot be obtained
    pub fn with_failing_encoder_query() -> Self {
        Self {
            encoder_query_fails: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl TranscodePort for FakeTranscoder {
    async fn transcode(&self, args: &[String]) -> Result<(), DomainError> {
        self.invocations.lock().unwrap().push(args.to_vec());
        Ok(())
    }

    async fn has_encoder(&self, encoder: &str) -> Result<bool, DomainError> {
        if self.encoder_query_fails {
            return Err(DomainError::ExecFail("ffmpeg -encoders exited with exit status: 1".to_string()));
        }
        Ok(self.encoders.iter().any(|e| e == encoder))
    }
}
