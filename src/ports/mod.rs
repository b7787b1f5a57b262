// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe a file and return its ordered stream list
    async fn probe(&self, file_path: &Path) -> Result<MediaInfo, DomainError>;
}

/// Port for running the transcoder
#[async_trait]
pub trait TranscodePort: Send + Sync {
    /// Run the transcoder with `args`; the output path is the last argument.
    ///
    /// A non-zero exit is reported as [`DomainError::ExecFail`].
    async fn transcode(&self, args: &[String]) -> Result<(), DomainError>;

    /// Whether the transcoder build ships the named encoder
    async fn has_encoder(&self, encoder: &str) -> Result<bool, DomainError>;
}

/// Port for content hashing of decoded streams
#[async_trait]
pub trait StreamHashPort: Send + Sync {
    /// Digest of `stream` of `file_path` decoded to its canonical raw form
    async fn stream_digest(&self, file_path: &Path, stream: &Stream) -> Result<StreamDigest, DomainError>;
}

/// Port for audio quality measurement
#[async_trait]
pub trait QualityMetricsPort: Send + Sync {
    /// Compare `original_stream` of `original` against `reencoded_stream` of `reencoded`
    async fn audio_quality(
        &self,
        original: &Path,
        original_stream: usize,
        reencoded: &Path,
        reencoded_stream: usize,
    ) -> Result<AudioQualityMetrics, DomainError>;
}

#[cfg(test)]
pub(crate) mod fakes;
