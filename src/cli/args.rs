//! Command-line argument definitions

use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::Args;

use crate::domain::usecases::{MAX_CRF, PRESETS};

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input .ts file, or a directory whose .ts files are converted one by one
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Output file path (default: input with .mp4 extension)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Constant Rate Factor for the video encoder (0-51)
    #[arg(long, env = "TS2MP4_CRF", value_parser = clap::value_parser!(u8).range(0..=MAX_CRF as i64))]
    pub crf: Option<u8>,

    /// x265 encoding preset
    #[arg(long, env = "TS2MP4_PRESET", value_parser = PossibleValuesParser::new(PRESETS.iter().copied()))]
    pub preset: Option<String>,

    /// Log file path (default: <input stem>-<timestamp>.log next to the input)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Media file to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
