// Inspect interactor - Orchestrates media file inspection use case

use std::fmt::Write;
use std::sync::Arc;

use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::usecases::*;
use crate::ports::*;

/// Interactor for media file inspection use case
pub struct InspectInteractor {
    probe_port: Arc<dyn ProbePort>,
}

impl InspectInteractor {
    /// Create new inspect interactor with injected ports
    pub fn new(probe_port: Arc<dyn ProbePort>) -> Self {
        Self { probe_port }
    }

    /// Probe the file and flag the streams a conversion would use
    pub async fn execute(&self, request: InspectRequest) -> Result<InspectResponse, DomainError> {
        info!("Starting media file inspection for: {}", request.input_file.display());

        let file = VideoFile::open(&request.input_file, self.probe_port.as_ref()).await?;
        info!("Media file probed successfully: {} streams", file.media_info().total_streams());

        let streams = file
            .streams()
            .iter()
            .map(|stream| InspectedStream {
                stream: stream.clone(),
                valid: stream.is_valid(),
            })
            .collect();

        Ok(InspectResponse {
            path: file.path().to_path_buf(),
            format_name: file.media_info().format_name.clone(),
            streams,
        })
    }

    /// Format the inspection as JSON
    pub fn format_as_json(response: &InspectResponse) -> Result<String, DomainError> {
        serde_json::to_string_pretty(response)
            .map_err(|e| DomainError::InternalError(format!("JSON serialization failed: {}", e)))
    }

    /// Format the inspection as human-readable text
    pub fn format_as_text(response: &InspectResponse) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "Media File Information:");
        let _ = writeln!(output, "  File: {}", response.path.display());
        let _ = writeln!(
            output,
            "  Container: {}",
            response.format_name.as_deref().unwrap_or("unknown")
        );
        let _ = writeln!(output, "  Total Streams: {}", response.streams.len());

        for entry in &response.streams {
            let stream = &entry.stream;
            let _ = write!(
                output,
                "  Stream #{}: {} {}",
                stream.index,
                stream.codec_type,
                stream.codec_name.as_deref().unwrap_or("unknown")
            );
            if let Some(profile) = &stream.profile {
                let _ = write!(output, " ({})", profile);
            }
            if stream.is_audio() {
                let _ = write!(
                    output,
                    ", {} channels, {} Hz",
                    stream.channels.unwrap_or(0),
                    stream.sample_rate.unwrap_or(0)
                );
            }
            if let Some(bit_rate) = stream.bit_rate {
                let _ = write!(output, ", {} kb/s", bit_rate / 1000);
            }
            if !entry.valid {
                let _ = write!(output, " [ignored]");
            }
            output.push('\n');
        }

        output
    }
}
