//! ts2mp4 Library
//!
//! Converts MPEG transport streams to MP4. Video is re-encoded to HEVC and
//! audio is stream-copied. Every copied stream is then verified bit-exactly
//! against its source by hashing the decoded content, and audio streams that
//! fail verification are re-encoded from the original in a single repair pass.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod output;
pub mod planner;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::DomainError;
pub use domain::model::{ConvertedVideoFile, MediaInfo, Stream, StreamSource, StreamSources, VideoFile};
pub use error::{Ts2Mp4Error, Ts2Mp4Result};
