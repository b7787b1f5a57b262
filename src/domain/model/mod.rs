// Domain models - Core types and data structures

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::errors::DomainError;
use crate::domain::rules::StreamSourceRules;
use crate::ports::ProbePort;

/// Kind of elementary stream as reported by the prober
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecType {
    Video,
    Audio,
    Subtitle,
    Data,
    Attachment,
}

impl CodecType {
    /// Whether the stream carries audio or video essence
    pub fn is_audio_or_video(&self) -> bool {
        matches!(self, CodecType::Video | CodecType::Audio)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CodecType::Video => "video",
            CodecType::Audio => "audio",
            CodecType::Subtitle => "subtitle",
            CodecType::Data => "data",
            CodecType::Attachment => "attachment",
        }
    }
}

impl FromStr for CodecType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(CodecType::Video),
            "audio" => Ok(CodecType::Audio),
            "subtitle" => Ok(CodecType::Subtitle),
            "data" => Ok(CodecType::Data),
            "attachment" => Ok(CodecType::Attachment),
            other => Err(DomainError::InvalidStreams(format!(
                "Unsupported codec type: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for CodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single probed elementary stream.
///
/// Streams are plain values: two streams with identical fields are the same stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Stream {
    pub index: usize,
    pub codec_type: CodecType,
    pub codec_name: Option<String>,
    pub profile: Option<String>,
    pub bit_rate: Option<u64>,
    pub channels: Option<u32>,
    pub sample_rate: Option<u32>,
}

impl Stream {
    /// Create a stream with only the fields every codec type has
    pub fn new(index: usize, codec_type: CodecType, codec_name: Option<String>) -> Self {
        Self {
            index,
            codec_type,
            codec_name,
            profile: None,
            bit_rate: None,
            channels: None,
            sample_rate: None,
        }
    }

    /// Create an audio stream
    pub fn audio(index: usize, codec_name: &str, channels: u32, sample_rate: u32) -> Self {
        Self {
            channels: Some(channels),
            sample_rate: Some(sample_rate),
            ..Self::new(index, CodecType::Audio, Some(codec_name.to_string()))
        }
    }

    /// Create a video stream
    pub fn video(index: usize, codec_name: &str) -> Self {
        Self::new(index, CodecType::Video, Some(codec_name.to_string()))
    }

    pub fn with_profile(mut self, profile: &str) -> Self {
        self.profile = Some(profile.to_string());
        self
    }

    pub fn with_bit_rate(mut self, bit_rate: u64) -> Self {
        self.bit_rate = Some(bit_rate);
        self
    }

    pub fn is_video(&self) -> bool {
        self.codec_type == CodecType::Video
    }

    pub fn is_audio(&self) -> bool {
        self.codec_type == CodecType::Audio
    }

    /// Audio streams with zero channels are an artifact of some broadcast
    /// sources and are never converted or verified.
    pub fn is_valid(&self) -> bool {
        match self.codec_type {
            CodecType::Video => true,
            CodecType::Audio => self.channels.map_or(false, |c| c > 0),
            _ => false,
        }
    }
}

/// Probed stream list of one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaInfo {
    pub format_name: Option<String>,
    streams: Vec<Stream>,
}

impl MediaInfo {
    /// Create media info, rejecting lists whose indices are not exactly `0..n`
    pub fn new(format_name: Option<String>, streams: Vec<Stream>) -> Result<Self, DomainError> {
        for (position, stream) in streams.iter().enumerate() {
            if stream.index != position {
                return Err(DomainError::InvalidStreams(format!(
                    "Stream index {} does not match position {}",
                    stream.index, position
                )));
            }
        }
        Ok(Self {
            format_name,
            streams,
        })
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn total_streams(&self) -> usize {
        self.streams.len()
    }
}

/// A media file on disk together with its probed streams.
///
/// Equality and hashing use the resolved path only.
#[derive(Debug, Clone)]
pub struct VideoFile {
    path: PathBuf,
    media_info: Arc<MediaInfo>,
}

impl VideoFile {
    /// Resolve `path` and probe it
    pub async fn open(path: impl AsRef<Path>, prober: &dyn ProbePort) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let resolved = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| DomainError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        let media_info = prober.probe(&resolved).await?;
        Ok(Self {
            path: resolved,
            media_info: Arc::new(media_info),
        })
    }

    /// Build from an already probed stream list; the path must exist
    pub fn from_media_info(path: impl AsRef<Path>, media_info: MediaInfo) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let resolved = std::fs::canonicalize(path)
            .map_err(|e| DomainError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            path: resolved,
            media_info: Arc::new(media_info),
        })
    }

    /// Same content, new location. Used after an atomic rename.
    pub fn relocated(&self, path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let resolved = std::fs::canonicalize(path)
            .map_err(|e| DomainError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            path: resolved,
            media_info: Arc::clone(&self.media_info),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn media_info(&self) -> &MediaInfo {
        &self.media_info
    }

    pub fn streams(&self) -> &[Stream] {
        self.media_info.streams()
    }

    pub fn stream(&self, index: usize) -> Option<&Stream> {
        self.streams().get(index)
    }

    pub fn video_streams(&self) -> Vec<&Stream> {
        self.streams().iter().filter(|s| s.is_video()).collect()
    }

    pub fn audio_streams(&self) -> Vec<&Stream> {
        self.streams().iter().filter(|s| s.is_audio()).collect()
    }

    pub fn valid_video_streams(&self) -> Vec<&Stream> {
        self.streams()
            .iter()
            .filter(|s| s.is_video() && s.is_valid())
            .collect()
    }

    /// Audio streams with a positive channel count
    pub fn valid_audio_streams(&self) -> Vec<&Stream> {
        self.streams()
            .iter()
            .filter(|s| s.is_audio() && s.is_valid())
            .collect()
    }

    /// Valid video streams followed by valid audio streams
    pub fn valid_streams(&self) -> Vec<&Stream> {
        let mut streams = self.valid_video_streams();
        streams.extend(self.valid_audio_streams());
        streams
    }
}

impl PartialEq for VideoFile {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for VideoFile {}

impl std::hash::Hash for VideoFile {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// How an output stream was produced from its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransformationKind {
    /// Re-encoded by the initial conversion
    Converted,
    /// Stream-copied without re-encoding
    Copied,
    /// Re-encoded by the repair pass
    ReEncoded,
}

impl fmt::Display for TransformationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformationKind::Converted => f.write_str("CONVERTED"),
            TransformationKind::Copied => f.write_str("COPIED"),
            TransformationKind::ReEncoded => f.write_str("RE_ENCODED"),
        }
    }
}

/// Provenance of one output stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSource {
    source_video_file: Arc<VideoFile>,
    source_stream: Stream,
    transformation_kind: TransformationKind,
}

impl StreamSource {
    /// Fails if `source_stream_index` does not exist in the source file
    pub fn new(
        source_video_file: Arc<VideoFile>,
        source_stream_index: usize,
        transformation_kind: TransformationKind,
    ) -> Result<Self, DomainError> {
        let source_stream = source_video_file
            .stream(source_stream_index)
            .cloned()
            .ok_or_else(|| {
                DomainError::InvalidStreamSources(format!(
                    "Stream {} not found in {}",
                    source_stream_index,
                    source_video_file.file_name()
                ))
            })?;
        Ok(Self {
            source_video_file,
            source_stream,
            transformation_kind,
        })
    }

    pub fn source_video_file(&self) -> &Arc<VideoFile> {
        &self.source_video_file
    }

    pub fn source_stream_index(&self) -> usize {
        self.source_stream.index
    }

    pub fn source_stream(&self) -> &Stream {
        &self.source_stream
    }

    pub fn transformation_kind(&self) -> TransformationKind {
        self.transformation_kind
    }
}

/// Pipeline stage whose invariants a [`StreamSources`] satisfies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStage {
    Initial,
    Repair,
}

/// Ordered provenance of every output stream; position is the output index
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSources {
    sources: Vec<StreamSource>,
    stage: ConversionStage,
}

impl StreamSources {
    /// Sources for the first pass: converted video and copied audio from one input
    pub fn for_initial_conversion(sources: Vec<StreamSource>) -> Result<Self, DomainError> {
        StreamSourceRules::validate_initial(&sources)?;
        Ok(Self {
            sources,
            stage: ConversionStage::Initial,
        })
    }

    /// Sources for the repair pass: copies from the encoded file, re-encodes from the original
    pub fn for_repair(sources: Vec<StreamSource>) -> Result<Self, DomainError> {
        StreamSourceRules::validate_repair(&sources)?;
        Ok(Self {
            sources,
            stage: ConversionStage::Repair,
        })
    }

    pub fn stage(&self) -> ConversionStage {
        self.stage
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn get(&self, output_index: usize) -> Option<&StreamSource> {
        self.sources.get(output_index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StreamSource> {
        self.sources.iter()
    }

    /// Output indices whose source has the given transformation kind
    pub fn indices_of_kind(&self, kind: TransformationKind) -> Vec<usize> {
        self.sources
            .iter()
            .enumerate()
            .filter(|(_, s)| s.transformation_kind() == kind)
            .map(|(i, _)| i)
            .collect()
    }

    /// Distinct source files in order of first appearance
    pub fn source_video_files(&self) -> Vec<Arc<VideoFile>> {
        let mut files: Vec<Arc<VideoFile>> = Vec::new();
        for source in &self.sources {
            if !files.iter().any(|f| f == source.source_video_file()) {
                files.push(Arc::clone(source.source_video_file()));
            }
        }
        files
    }
}

impl<'a> IntoIterator for &'a StreamSources {
    type Item = &'a StreamSource;
    type IntoIter = std::slice::Iter<'a, StreamSource>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}

/// An output file paired with the provenance of each of its streams
#[derive(Debug, Clone)]
pub struct ConvertedVideoFile {
    file: Arc<VideoFile>,
    stream_sources: StreamSources,
}

impl ConvertedVideoFile {
    /// Fails unless there is exactly one source per probed stream
    pub fn new(file: Arc<VideoFile>, stream_sources: StreamSources) -> Result<Self, DomainError> {
        let stream_count = file.streams().len();
        if stream_sources.len() != stream_count {
            return Err(DomainError::InvalidStreamSources(format!(
                "Number of stream sources ({}) does not match number of streams ({}) in {}",
                stream_sources.len(),
                stream_count,
                file.file_name()
            )));
        }
        Ok(Self {
            file,
            stream_sources,
        })
    }

    pub fn file(&self) -> &Arc<VideoFile> {
        &self.file
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn stream_sources(&self) -> &StreamSources {
        &self.stream_sources
    }

    /// Each output stream with the source that produced it
    pub fn stream_with_sources(&self) -> impl Iterator<Item = (&Stream, &StreamSource)> {
        self.file.streams().iter().zip(self.stream_sources.iter())
    }

    /// Output index of the stream produced from `source_stream_index` of `source`
    pub fn output_index_for(&self, source: &VideoFile, source_stream_index: usize) -> Option<usize> {
        self.stream_sources.iter().position(|s| {
            s.source_video_file().as_ref() == source && s.source_stream_index() == source_stream_index
        })
    }

    /// Same provenance, file moved to `path`
    pub fn relocated(&self, path: impl AsRef<Path>) -> Result<Self, DomainError> {
        Self::new(Arc::new(self.file.relocated(path)?), self.stream_sources.clone())
    }
}

/// 128-bit content digest of a decoded stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamDigest([u8; 16]);

impl StreamDigest {
    pub fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for StreamDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Audio quality of a re-encoded stream against its original, in dB
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AudioQualityMetrics {
    /// Average peak signal-to-noise ratio
    pub apsnr: Option<f64>,
    /// Average signal-to-distortion ratio
    pub asdr: Option<f64>,
}

impl AudioQualityMetrics {
    pub fn is_empty(&self) -> bool {
        self.apsnr.is_none() && self.asdr.is_none()
    }
}

impl fmt::Display for AudioQualityMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(apsnr) = self.apsnr {
            parts.push(format!("APSNR={:.2}dB", apsnr));
        }
        if let Some(asdr) = self.asdr {
            parts.push(format!("ASDR={:.2}dB", asdr));
        }
        f.write_str(&parts.join(", "))
    }
}

/// Quality metrics keyed by output stream index
pub type QualityReport = BTreeMap<usize, AudioQualityMetrics>;

#[cfg(test)]
mod tests;
