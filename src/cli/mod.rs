//! CLI module for ts2mp4
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};

use crate::adapters::toml_config::LOG_LEVELS;

pub mod args;
pub mod commands;

pub use args::{ConvertArgs, InspectArgs};

/// ts2mp4 - MPEG transport stream to MP4 converter
///
/// Converts video to HEVC, stream-copies audio, verifies every copied stream
/// bit-exactly against its source and re-encodes only the audio streams that
/// fail verification.
#[derive(Parser, Debug)]
#[command(name = "ts2mp4")]
#[command(about = "Convert MPEG transport streams to MP4 with verified stream provenance")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (RUST_LOG takes precedence)
    #[arg(long, global = true, env = "TS2MP4_LOG_LEVEL", value_parser = PossibleValuesParser::new(LOG_LEVELS.iter().copied()))]
    pub log_level: Option<String>,

    /// Configuration file (default: ./ts2mp4.toml if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// ffmpeg executable
    #[arg(long, global = true, env = "TS2MP4_FFMPEG", value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// ffprobe executable
    #[arg(long, global = true, env = "TS2MP4_FFPROBE", value_name = "PATH")]
    pub ffprobe: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a .ts file, or every .ts file in a directory, to MP4
    Convert(args::ConvertArgs),
    /// Show the probed streams of a media file
    Inspect(args::InspectArgs),
}
