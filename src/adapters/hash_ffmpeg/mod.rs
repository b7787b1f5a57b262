//! FFmpeg stream hashing adapter
//!
//! Decodes one stream to raw PCM or raw video frames on stdout and feeds
//! the bytes into MD5 as they arrive.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// MD5 of decoded stream content, computed by ffmpeg
pub struct FFmpegHashAdapter {
    ffmpeg_path: PathBuf,
}

impl FFmpegHashAdapter {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    /// Raw output format for a codec type
    pub fn raw_format(codec_type: CodecType) -> Result<&'static str, DomainError> {
        match codec_type {
            CodecType::Audio => Ok("s16le"),
            CodecType::Video => Ok("rawvideo"),
            other => Err(DomainError::InternalError(format!(
                "Cannot hash {} streams",
                other
            ))),
        }
    }

    fn hash_args(file_path: &Path, stream: &Stream) -> Result<Vec<String>, DomainError> {
        Ok(vec![
            "-hide_banner".to_string(),
            "-nostats".to_string(),
            "-i".to_string(),
            file_path.display().to_string(),
            "-map".to_string(),
            format!("0:{}", stream.index),
            "-f".to_string(),
            Self::raw_format(stream.codec_type)?.to_string(),
            "-".to_string(),
        ])
    }
}

#[async_trait]
impl StreamHashPort for FFmpegHashAdapter {
    async fn stream_digest(&self, file_path: &Path, stream: &Stream) -> Result<StreamDigest, DomainError> {
        let args = Self::hash_args(file_path, stream)?;
        debug!("Hashing: {} {}", self.ffmpeg_path.display(), args.join(" "));

        let fail = |message: String| {
            DomainError::HashFail(format!(
                "{} stream {}: {}",
                file_path.display(),
                stream.index,
                message
            ))
        };

        let mut child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| fail(format!("failed to run {}: {}", self.ffmpeg_path.display(), e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| fail("stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| fail("stderr not captured".to_string()))?;

        let digest = async {
            let mut reader = stdout;
            let mut context = md5::Context::new();
            let mut buffer = vec![0u8; READ_BUFFER_SIZE];
            loop {
                let bytes_read = reader.read(&mut buffer).await?;
                if bytes_read == 0 {
                    break;
                }
                context.consume(&buffer[..bytes_read]);
            }
            Ok::<_, std::io::Error>(context.compute())
        };

        // stderr must be read to EOF whatever its encoding, or ffmpeg dies on SIGPIPE
        let drain = async {
            let mut reader = BufReader::new(stderr);
            let mut line = Vec::new();
            loop {
                line.clear();
                match reader.read_until(b'\n', &mut line).await {
                    Ok(0) => break,
                    Ok(_) => debug!("ffmpeg: {}", String::from_utf8_lossy(&line).trim_end()),
                    Err(e) => {
                        warn!("Failed to read ffmpeg stderr: {}", e);
                        break;
                    }
                }
            }
        };

        let (digest, ()) = tokio::join!(digest, drain);
        let digest = digest.map_err(|e| fail(format!("failed to read decoded data: {}", e)))?;

        let status = child
            .wait()
            .await
            .map_err(|e| fail(format!("failed to wait for ffmpeg: {}", e)))?;
        if !status.success() {
            return Err(fail(format!("ffmpeg exited with {}", status)));
        }

        Ok(StreamDigest::new(digest.0))
    }
}
