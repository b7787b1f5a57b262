//! FFprobe adapter for media file probing
//!
//! Runs `ffprobe -of json -show_format -show_streams` and maps the JSON
//! document onto the domain stream model.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// FFprobe-based probe adapter
#[derive(Debug, Clone)]
pub struct FFprobeAdapter {
    ffprobe_path: PathBuf,
}

impl FFprobeAdapter {
    /// Create an adapter running the given ffprobe executable
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self { ffprobe_path }
    }

    /// Map ffprobe JSON output onto [`MediaInfo`]
    pub fn parse_output(json: &str) -> Result<MediaInfo, DomainError> {
        let output: FfprobeOutput = serde_json::from_str(json)
            .map_err(|e| DomainError::ProbeFail(format!("ffprobe JSON parse error: {}", e)))?;

        let streams = output
            .streams
            .into_iter()
            .map(FfprobeStream::into_stream)
            .collect::<Result<Vec<_>, _>>()?;

        MediaInfo::new(output.format.and_then(|f| f.format_name), streams)
    }
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe(&self, file_path: &Path) -> Result<MediaInfo, DomainError> {
        debug!("Probing {}", file_path.display());

        let output = Command::new(&self.ffprobe_path)
            .args(["-hide_banner", "-v", "error", "-show_format", "-show_streams", "-of", "json"])
            .arg(file_path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                DomainError::ProbeFail(format!(
                    "Failed to run {}: {}",
                    self.ffprobe_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(DomainError::ProbeFail(format!(
                "ffprobe exited with {} for {}: {}",
                output.status,
                file_path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Self::parse_output(&String::from_utf8_lossy(&output.stdout))
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: usize,
    codec_type: Option<String>,
    codec_name: Option<String>,
    profile: Option<String>,
    bit_rate: Option<String>,
    channels: Option<u32>,
    sample_rate: Option<String>,
}

impl FfprobeStream {
    fn into_stream(self) -> Result<Stream, DomainError> {
        let codec_type = self
            .codec_type
            .as_deref()
            .ok_or_else(|| DomainError::ProbeFail(format!("Stream {} has no codec type", self.index)))?
            .parse::<CodecType>()
            .map_err(|e| DomainError::ProbeFail(format!("Stream {}: {}", self.index, e)))?;

        Ok(Stream {
            index: self.index,
            codec_type,
            codec_name: self.codec_name,
            profile: self.profile,
            bit_rate: parse_number(self.bit_rate.as_deref()),
            channels: self.channels,
            sample_rate: parse_number(self.sample_rate.as_deref()),
        })
    }
}

/// ffprobe reports some numbers as strings, and "N/A" when unknown
fn parse_number<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}
