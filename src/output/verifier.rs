//! Integrity verification of copied streams

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::ports::StreamHashPort;

/// Compares decoded content digests of copied streams with their sources
pub struct IntegrityVerifier {
    hasher: Arc<dyn StreamHashPort>,
}

impl IntegrityVerifier {
    pub fn new(hasher: Arc<dyn StreamHashPort>) -> Self {
        Self { hasher }
    }

    /// Verify every `COPIED` stream of `file`, stopping at the first mismatch.
    ///
    /// Converted and re-encoded streams are skipped. A file without copied
    /// streams verifies trivially.
    pub async fn verify(&self, file: &ConvertedVideoFile) -> Result<(), DomainError> {
        let mut checked = 0usize;

        for (output_index, (stream, source)) in file.stream_with_sources().enumerate() {
            if source.transformation_kind() != TransformationKind::Copied {
                continue;
            }

            let source_file = source.source_video_file();
            let expected = self
                .hasher
                .stream_digest(source_file.path(), source.source_stream())
                .await?;
            let actual = self.hasher.stream_digest(file.path(), stream).await?;

            if expected != actual {
                return Err(DomainError::StreamIntegrity {
                    output_stream_index: output_index,
                    source_file: source_file.file_name(),
                    source_stream_index: source.source_stream_index(),
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }

            debug!(
                "Output stream {} matches {} stream {} ({})",
                output_index,
                source_file.file_name(),
                source.source_stream_index(),
                actual
            );
            checked += 1;
        }

        info!("Verified {} copied streams of {}", checked, file.file().file_name());
        Ok(())
    }
}
