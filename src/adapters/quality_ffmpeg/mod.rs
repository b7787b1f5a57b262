//! FFmpeg audio quality adapter
//!
//! Runs the `apsnr` and `asdr` filters over an original and a re-encoded
//! stream and reads the reported figures back from stderr.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

const VALUE_PATTERN: &str = r"([-+]?[0-9]*\.?[0-9]+(?:[eE][-+]?[0-9]+)?|-?inf|-?nan) dB";

pub struct FFmpegQualityAdapter {
    ffmpeg_path: PathBuf,
    psnr_regex: Regex,
    sdr_regex: Regex,
}

impl FFmpegQualityAdapter {
    pub fn new(ffmpeg_path: PathBuf) -> Result<Self, DomainError> {
        let compile = |prefix: &str| {
            Regex::new(&format!(r"{} ch\d+: {}", prefix, VALUE_PATTERN))
                .map_err(|e| DomainError::InternalError(format!("Invalid metrics pattern: {}", e)))
        };
        Ok(Self {
            ffmpeg_path,
            psnr_regex: compile("PSNR")?,
            sdr_regex: compile("SDR")?,
        })
    }

    /// First APSNR and ASDR figures found in filter output
    pub fn parse_metrics(&self, output: &str) -> AudioQualityMetrics {
        let mut metrics = AudioQualityMetrics::default();

        for line in output.lines() {
            if metrics.apsnr.is_none() && line.contains("Parsed_apsnr") {
                metrics.apsnr = Self::capture(&self.psnr_regex, line);
            }
            if metrics.asdr.is_none() && line.contains("Parsed_asdr") {
                metrics.asdr = Self::capture(&self.sdr_regex, line);
            }
        }
        metrics
    }

    fn capture(regex: &Regex, line: &str) -> Option<f64> {
        let value = regex.captures(line).and_then(|c| c.get(1));
        match value.map(|v| v.as_str()) {
            Some("-nan") | Some("nan") => Some(f64::NAN),
            Some("inf") => Some(f64::INFINITY),
            Some("-inf") => Some(f64::NEG_INFINITY),
            Some(number) => number.parse().ok(),
            None => {
                warn!("Could not find a metric in line: {}", line);
                None
            }
        }
    }

    fn metrics_args(original: &Path, original_stream: usize, reencoded: &Path, reencoded_stream: usize) -> Vec<String> {
        let pair = format!("[0:{}][1:{}]", original_stream, reencoded_stream);
        vec![
            "-hide_banner".to_string(),
            "-nostats".to_string(),
            "-i".to_string(),
            original.display().to_string(),
            "-i".to_string(),
            reencoded.display().to_string(),
            "-filter_complex".to_string(),
            format!("{pair}apsnr;{pair}asdr"),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ]
    }
}

#[async_trait]
impl QualityMetricsPort for FFmpegQualityAdapter {
    async fn audio_quality(
        &self,
        original: &Path,
        original_stream: usize,
        reencoded: &Path,
        reencoded_stream: usize,
    ) -> Result<AudioQualityMetrics, DomainError> {
        let args = Self::metrics_args(original, original_stream, reencoded, reencoded_stream);
        debug!("Measuring quality: {} {}", self.ffmpeg_path.display(), args.join(" "));

        let output = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| DomainError::ExecFail(format!("Failed to run {}: {}", self.ffmpeg_path.display(), e)))?;

        if !output.status.success() {
            return Err(DomainError::ExecFail(format!(
                "Quality measurement exited with {}",
                output.status
            )));
        }

        Ok(self.parse_metrics(&String::from_utf8_lossy(&output.stderr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> FFmpegQualityAdapter {
        FFmpegQualityAdapter::new(PathBuf::from("ffmpeg")).unwrap()
    }

    #[test]
    fn test_parse_both_metrics() {
        let metrics = adapter().parse_metrics(
            "[Parsed_apsnr_0 @ 0x7f9990004800] PSNR ch0: 30.00 dB\n\
             [Parsed_asdr_1 @ 0x7f9990004ac0] SDR ch0: -5.25 dB",
        );
        assert_eq!(metrics.apsnr, Some(30.0));
        assert_eq!(metrics.asdr, Some(-5.25));
    }

    #[test]
    fn test_parse_infinite_and_nan() {
        let metrics = adapter().parse_metrics(
            "[Parsed_apsnr_0 @ 0x1] PSNR ch0: inf dB\n[Parsed_asdr_1 @ 0x2] SDR ch1: -nan dB",
        );
        assert_eq!(metrics.apsnr, Some(f64::INFINITY));
        assert!(metrics.asdr.unwrap().is_nan());
    }

    #[test]
    fn test_first_channel_wins() {
        let metrics = adapter().parse_metrics(
            "[Parsed_apsnr_0 @ 0x123] PSNR ch0: 10.0 dB\n[Parsed_apsnr_0 @ 0x123] PSNR ch1: 20.0 dB",
        );
        assert_eq!(metrics.apsnr, Some(10.0));
        assert_eq!(metrics.asdr, None);
    }

    #[test]
    fn test_unparseable_values_are_absent() {
        let a = adapter();
        assert!(a.parse_metrics("No metrics here").is_empty());
        assert!(a
            .parse_metrics("[Parsed_apsnr_0 @ 0x7f9990004800] PSNR ch0: invalid dB")
            .is_empty());
        assert!(a
            .parse_metrics("[Parsed_asdr_1 @ 0x7f9990004ac0] SDR ch0: invalid dB")
            .is_empty());
    }

    #[test]
    fn test_metrics_args() {
        let args = FFmpegQualityAdapter::metrics_args(Path::new("in.ts"), 2, Path::new("out.mp4"), 1);
        assert_eq!(
            args.join(" "),
            "-hide_banner -nostats -i in.ts -i out.mp4 -filter_complex [0:2][1:1]apsnr;[0:2][1:1]asdr -f null -"
        );
    }
}
