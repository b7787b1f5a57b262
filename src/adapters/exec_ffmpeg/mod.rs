//! FFmpeg execution adapter
//!
//! Runs transcoder passes as `ffmpeg` subprocesses and answers encoder
//! availability queries from a list fetched once per adapter.

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::ports::*;

/// Trailing stderr lines kept for error reports
const STDERR_TAIL_LINES: usize = 20;

/// FFmpeg-based execution adapter
pub struct FFmpegAdapter {
    ffmpeg_path: PathBuf,
    encoders: OnceCell<HashSet<String>>,
}

impl FFmpegAdapter {
    /// Create an adapter running the given ffmpeg executable
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            encoders: OnceCell::new(),
        }
    }

    /// Encoder names from `ffmpeg -encoders` output
    pub fn parse_encoders(listing: &str) -> HashSet<String> {
        listing
            .lines()
            .skip_while(|line| !line.trim_start().starts_with("------"))
            .skip(1)
            .filter_map(|line| line.split_whitespace().nth(1))
            .map(str::to_string)
            .collect()
    }

    async fn list_encoders(&self) -> Result<HashSet<String>, DomainError> {
        let output = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(DomainError::ExecFail(format!(
                "ffmpeg -encoders exited with {}",
                output.status
            )));
        }

        let encoders = Self::parse_encoders(&String::from_utf8_lossy(&output.stdout));
        debug!("ffmpeg reports {} encoders", encoders.len());
        Ok(encoders)
    }

    fn spawn_error(&self, e: std::io::Error) -> DomainError {
        DomainError::ExecFail(format!("Failed to run {}: {}", self.ffmpeg_path.display(), e))
    }
}

#[async_trait]
impl TranscodePort for FFmpegAdapter {
    async fn transcode(&self, args: &[String]) -> Result<(), DomainError> {
        info!("Running: {} {}", self.ffmpeg_path.display(), args.join(" "));

        let mut child = Command::new(&self.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        if let Some(stderr) = child.stderr.take() {
            let mut reader = BufReader::new(stderr);
            let mut buffer = Vec::new();
            loop {
                buffer.clear();
                let bytes_read = reader
                    .read_until(b'\n', &mut buffer)
                    .await
                    .map_err(|e| DomainError::ExecFail(format!("Failed to read ffmpeg output: {}", e)))?;
                if bytes_read == 0 {
                    break;
                }
                // stderr carries stream metadata in arbitrary encodings
                let line = String::from_utf8_lossy(&buffer).trim_end().to_string();
                debug!("ffmpeg: {}", line);
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| DomainError::ExecFail(format!("Failed to wait for ffmpeg: {}", e)))?;

        if !status.success() {
            return Err(DomainError::ExecFail(format!(
                "ffmpeg exited with {}: {}",
                status,
                Vec::from(tail).join("\n")
            )));
        }
        Ok(())
    }

    async fn has_encoder(&self, encoder: &str) -> Result<bool, DomainError> {
        let encoders = self
            .encoders
            .get_or_try_init(|| self.list_encoders())
            .await?;
        Ok(encoders.contains(encoder))
    }
}
