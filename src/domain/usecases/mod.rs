// Domain use cases - Requests and responses crossing the application boundary

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::errors::*;
use crate::domain::model::*;

/// x265 speed/efficiency presets accepted by the initial conversion
pub const PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
    "placebo",
];

/// Highest constant rate factor accepted by the video encoder
pub const MAX_CRF: u8 = 51;

/// Video encoder settings for the initial conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingOptions {
    pub crf: u8,
    pub preset: String,
}

impl EncodingOptions {
    /// Create validated encoding options
    pub fn new(crf: u8, preset: &str) -> Result<Self, DomainError> {
        if crf > MAX_CRF {
            return Err(DomainError::BadArgs(format!(
                "CRF value {} exceeds {}",
                crf, MAX_CRF
            )));
        }
        if !PRESETS.contains(&preset) {
            return Err(DomainError::BadArgs(format!(
                "Invalid preset: {}. Valid presets: {}",
                preset,
                PRESETS.join(", ")
            )));
        }
        Ok(Self {
            crf,
            preset: preset.to_string(),
        })
    }
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            crf: 22,
            preset: "medium".to_string(),
        }
    }
}

/// Request to convert one transport stream
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub options: EncodingOptions,
}

impl ConvertRequest {
    pub fn new(input_file: PathBuf, output_file: PathBuf, options: EncodingOptions) -> Result<Self, DomainError> {
        if resolve_path(&input_file) == resolve_path(&output_file) {
            return Err(DomainError::BadArgs(format!(
                "Output file must differ from input file: {}",
                input_file.display()
            )));
        }
        Ok(Self {
            input_file,
            output_file,
            options,
        })
    }
}

/// Canonical form of a path whose final component may not exist yet
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

/// How the pipeline reached its successful end state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// The first pass verified cleanly
    Verified,
    /// Verification failed but no stream was identified as repairable
    NothingToRepair,
    /// The listed output streams were re-encoded by the repair pass
    Repaired { re_encoded_streams: Vec<usize> },
}

impl fmt::Display for ConversionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionOutcome::Verified => write!(f, "verified"),
            ConversionOutcome::NothingToRepair => write!(f, "verification failed, nothing to repair"),
            ConversionOutcome::Repaired { re_encoded_streams } => {
                write!(f, "repaired (re-encoded streams {:?})", re_encoded_streams)
            }
        }
    }
}

/// Result of a successful conversion
#[derive(Debug, Clone)]
pub struct ConvertResponse {
    pub output_file: ConvertedVideoFile,
    pub outcome: ConversionOutcome,
    pub quality: QualityReport,
}

/// Request to inspect a media file
#[derive(Debug, Clone)]
pub struct InspectRequest {
    pub input_file: PathBuf,
}

/// One probed stream with its validity as seen by the converter
#[derive(Debug, Clone, Serialize)]
pub struct InspectedStream {
    #[serde(flatten)]
    pub stream: Stream,
    pub valid: bool,
}

/// Probe result for display
#[derive(Debug, Clone, Serialize)]
pub struct InspectResponse {
    pub path: PathBuf,
    pub format_name: Option<String>,
    pub streams: Vec<InspectedStream>,
}
