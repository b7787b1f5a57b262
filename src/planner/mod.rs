//! Transcoder pass planning
//!
//! A plan pairs the provenance of every output stream with the transcoder
//! arguments that produce it. The Nth `-map` in the arguments always yields
//! output stream N, so the two halves stay in lockstep.

use crate::domain::model::StreamSources;

pub mod initial;
pub mod repair;

pub use initial::InitialPlanner;
pub use repair::RepairPlanner;

/// Arguments shared by every transcoder pass
pub(crate) const COMMON_ARGS: &[&str] = &["-hide_banner", "-nostats", "-fflags", "+discardcorrupt", "-y"];

/// Bitstream filter converting ADTS framed AAC to the MP4 layout
pub(crate) const AAC_ADTS_TO_ASC: &str = "aac_adtstoasc";

/// One transcoder pass
#[derive(Debug, Clone)]
pub struct ConversionPlan {
    /// Provenance, one entry per output stream
    pub stream_sources: StreamSources,
    /// Transcoder arguments, output path last
    pub ffmpeg_args: Vec<String>,
}
