//! Selective repair planning
//!
//! Compares every valid audio stream of the original file with its copy in
//! the first-pass output and plans a second pass that keeps the faithful
//! copies and re-encodes the rest from the original.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::domain::rules::{is_reencode_supported, AacProfileMap};
use crate::planner::{ConversionPlan, AAC_ADTS_TO_ASC, COMMON_ARGS};
use crate::ports::{StreamHashPort, TranscodePort};

/// Preferred AAC encoder when the transcoder build ships it
pub const FDK_AAC_ENCODER: &str = "libfdk_aac";
/// Built-in AAC encoder
pub const NATIVE_AAC_ENCODER: &str = "aac";

pub struct RepairPlanner {
    hasher: Arc<dyn StreamHashPort>,
    transcoder: Arc<dyn TranscodePort>,
}

impl RepairPlanner {
    pub fn new(hasher: Arc<dyn StreamHashPort>, transcoder: Arc<dyn TranscodePort>) -> Self {
        Self { hasher, transcoder }
    }

    /// Plan a repair pass writing to `output_path`.
    ///
    /// Returns `Ok(None)` when every audio copy matches its original.
    pub async fn plan(
        &self,
        original: &Arc<VideoFile>,
        encoded: &ConvertedVideoFile,
        output_path: &Path,
    ) -> Result<Option<ConversionPlan>, DomainError> {
        let mut sources = Vec::new();

        for stream in original.valid_video_streams() {
            let output_index = Self::matching_output(original, encoded, stream)?;
            sources.push(StreamSource::new(
                Arc::clone(encoded.file()),
                output_index,
                TransformationKind::Copied,
            )?);
        }

        for stream in original.valid_audio_streams() {
            let output_index = Self::matching_output(original, encoded, stream)?;
            let source = if self.copy_is_faithful(original, encoded, stream, output_index).await {
                StreamSource::new(Arc::clone(encoded.file()), output_index, TransformationKind::Copied)?
            } else {
                info!(
                    "Audio stream {} of {} will be re-encoded from the original",
                    stream.index,
                    original.file_name()
                );
                StreamSource::new(Arc::clone(original), stream.index, TransformationKind::ReEncoded)?
            };
            sources.push(source);
        }

        if !sources
            .iter()
            .any(|s| s.transformation_kind() == TransformationKind::ReEncoded)
        {
            info!("All audio streams of {} match, nothing to repair", encoded.file().file_name());
            return Ok(None);
        }

        let stream_sources = StreamSources::for_repair(sources)?;
        let ffmpeg_args = self.build_ffmpeg_args(&stream_sources, output_path).await?;

        Ok(Some(ConversionPlan {
            stream_sources,
            ffmpeg_args,
        }))
    }

    /// Output index of the copy of `stream`, by recorded provenance
    fn matching_output(
        original: &VideoFile,
        encoded: &ConvertedVideoFile,
        stream: &Stream,
    ) -> Result<usize, DomainError> {
        encoded
            .output_index_for(original, stream.index)
            .filter(|&i| encoded.file().stream(i).is_some())
            .ok_or_else(|| DomainError::MissingStream {
                file: encoded.file().file_name(),
                source_stream_index: stream.index,
            })
    }

    /// Digest comparison; a digest that cannot be computed counts as a mismatch
    async fn copy_is_faithful(
        &self,
        original: &VideoFile,
        encoded: &ConvertedVideoFile,
        stream: &Stream,
        output_index: usize,
    ) -> bool {
        let Some(encoded_stream) = encoded.file().stream(output_index) else {
            return false;
        };

        let expected = self.hasher.stream_digest(original.path(), stream).await;
        let actual = self.hasher.stream_digest(encoded.path(), encoded_stream).await;

        match (expected, actual) {
            (Ok(expected), Ok(actual)) => {
                debug!(
                    "Stream {} digest {} vs output stream {} digest {}",
                    stream.index, expected, output_index, actual
                );
                expected == actual
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Could not hash audio stream {}: {}", stream.index, e);
                false
            }
        }
    }

    async fn build_ffmpeg_args(
        &self,
        stream_sources: &StreamSources,
        output_path: &Path,
    ) -> Result<Vec<String>, DomainError> {
        let input_files = stream_sources.source_video_files();

        let mut args: Vec<String> = COMMON_ARGS.iter().map(|a| a.to_string()).collect();
        for file in &input_files {
            args.push("-i".to_string());
            args.push(file.path().display().to_string());
        }

        let mut encoder: Option<&'static str> = None;

        for (output_index, source) in stream_sources.iter().enumerate() {
            let input_index = input_files
                .iter()
                .position(|f| f == source.source_video_file())
                .ok_or_else(|| {
                    DomainError::InternalError(format!(
                        "Source file {} is not an input of the repair pass",
                        source.source_video_file().file_name()
                    ))
                })?;
            args.push("-map".to_string());
            args.push(format!("{}:{}", input_index, source.source_stream_index()));

            match source.transformation_kind() {
                TransformationKind::ReEncoded => {
                    let codec = match encoder {
                        Some(codec) => codec,
                        None => {
                            let codec = self.select_aac_encoder().await;
                            encoder = Some(codec);
                            codec
                        }
                    };
                    args.extend(Self::reencode_args(output_index, source.source_stream(), codec)?);
                }
                _ => {
                    args.push(format!("-codec:{}", output_index));
                    args.push("copy".to_string());
                }
            }
        }

        args.push("-f".to_string());
        args.push("mp4".to_string());
        args.push(output_path.display().to_string());
        Ok(args)
    }

    /// libfdk_aac when ffmpeg lists it; an encoder query that fails counts as absent
    async fn select_aac_encoder(&self) -> &'static str {
        match self.transcoder.has_encoder(FDK_AAC_ENCODER).await {
            Ok(true) => FDK_AAC_ENCODER,
            Ok(false) => {
                warn!("libfdk_aac is not available. Falling back to the default AAC encoder.");
                NATIVE_AAC_ENCODER
            }
            Err(e) => {
                warn!("Could not list ffmpeg encoders ({}). Falling back to the default AAC encoder.", e);
                NATIVE_AAC_ENCODER
            }
        }
    }

    fn reencode_args(output_index: usize, stream: &Stream, codec: &str) -> Result<Vec<String>, DomainError> {
        if !is_reencode_supported(stream.codec_name.as_deref()) {
            return Err(DomainError::NotImplemented(format!(
                "Re-encoding {} audio (stream {}) is not supported",
                stream.codec_name.as_deref().unwrap_or("unknown"),
                stream.index
            )));
        }

        let n = output_index;
        let mut args = vec![format!("-codec:{}", n), codec.to_string()];
        if let Some(rate) = stream.sample_rate {
            args.push(format!("-ar:{}", n));
            args.push(rate.to_string());
        }
        if let Some(channels) = stream.channels {
            args.push(format!("-ac:{}", n));
            args.push(channels.to_string());
        }
        if let Some(profile) = stream.profile.as_deref().and_then(AacProfileMap::encoder_profile) {
            args.push(format!("-profile:{}", n));
            args.push(profile.to_string());
        }
        if let Some(bit_rate) = stream.bit_rate {
            args.push(format!("-b:{}", n));
            args.push(bit_rate.to_string());
        }
        args.push(format!("-bsf:{}", n));
        args.push(AAC_ADTS_TO_ASC.to_string());
        Ok(args)
    }
}
