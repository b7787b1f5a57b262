// Convert interactor - Orchestrates the convert, verify and repair pipeline

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::usecases::*;
use crate::output::IntegrityVerifier;
use crate::planner::{ConversionPlan, InitialPlanner, RepairPlanner};
use crate::ports::*;
use crate::utils::PathUtils;

/// Pipeline position. Repair is entered at most once.
enum PipelineState {
    Initial,
    Verifying {
        converted: ConvertedVideoFile,
    },
    Repairing {
        converted: ConvertedVideoFile,
        cause: DomainError,
    },
    ReVerifying {
        repaired: ConvertedVideoFile,
    },
    Done {
        converted: ConvertedVideoFile,
        outcome: ConversionOutcome,
    },
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Initial => "INITIAL",
            PipelineState::Verifying { .. } => "VERIFYING",
            PipelineState::Repairing { .. } => "REPAIRING",
            PipelineState::ReVerifying { .. } => "RE-VERIFYING",
            PipelineState::Done { .. } => "DONE",
        };
        f.write_str(name)
    }
}

/// Interactor for the TS to MP4 conversion use case
pub struct ConvertInteractor {
    probe_port: Arc<dyn ProbePort>,
    transcode_port: Arc<dyn TranscodePort>,
    quality_port: Arc<dyn QualityMetricsPort>,
    verifier: IntegrityVerifier,
    repair_planner: RepairPlanner,
}

impl ConvertInteractor {
    /// Create new convert interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        transcode_port: Arc<dyn TranscodePort>,
        hash_port: Arc<dyn StreamHashPort>,
        quality_port: Arc<dyn QualityMetricsPort>,
    ) -> Self {
        Self {
            verifier: IntegrityVerifier::new(Arc::clone(&hash_port)),
            repair_planner: RepairPlanner::new(hash_port, Arc::clone(&transcode_port)),
            probe_port,
            transcode_port,
            quality_port,
        }
    }

    /// Convert one transport stream.
    ///
    /// Succeeds only if the output passed verification, either directly or
    /// after a single repair pass.
    pub async fn execute(&self, request: ConvertRequest) -> Result<ConvertResponse, DomainError> {
        info!(
            "Converting {} to {} (crf {}, preset {})",
            request.input_file.display(),
            request.output_file.display(),
            request.options.crf,
            request.options.preset
        );

        let input = Arc::new(VideoFile::open(&request.input_file, self.probe_port.as_ref()).await?);
        let output_path = request.output_file.as_path();
        let temp_path = PathUtils::temp_output_path(output_path);

        let mut state = PipelineState::Initial;
        loop {
            info!("Pipeline state: {}", state);
            state = match state {
                PipelineState::Initial => {
                    let plan = InitialPlanner::new(request.options.clone()).plan(&input, output_path)?;
                    let converted = self.run_pass(plan, output_path).await?;
                    PipelineState::Verifying { converted }
                }
                PipelineState::Verifying { converted } => match self.verifier.verify(&converted).await {
                    Ok(()) => PipelineState::Done {
                        converted,
                        outcome: ConversionOutcome::Verified,
                    },
                    Err(cause) if cause.is_integrity_failure() => {
                        warn!("Verification failed: {}", cause);
                        PipelineState::Repairing { converted, cause }
                    }
                    Err(e) => return Err(e),
                },
                PipelineState::Repairing { converted, cause } => {
                    match self.repair_planner.plan(&input, &converted, &temp_path).await? {
                        Some(plan) => {
                            let repaired = self.run_pass(plan, &temp_path).await?;
                            PipelineState::ReVerifying { repaired }
                        }
                        None => {
                            warn!(
                                "Verification failed ({}) but no stream needs repair, keeping {}",
                                cause,
                                converted.path().display()
                            );
                            PipelineState::Done {
                                converted,
                                outcome: ConversionOutcome::NothingToRepair,
                            }
                        }
                    }
                }
                PipelineState::ReVerifying { repaired } => match self.verifier.verify(&repaired).await {
                    Ok(()) => {
                        let promoted = Self::promote(&repaired, output_path).await?;
                        let re_encoded_streams = promoted
                            .stream_sources()
                            .indices_of_kind(TransformationKind::ReEncoded);
                        PipelineState::Done {
                            converted: promoted,
                            outcome: ConversionOutcome::Repaired { re_encoded_streams },
                        }
                    }
                    Err(e) => {
                        self.report_quality(&repaired).await;
                        warn!("Repaired file left at {}", repaired.path().display());
                        return Err(e);
                    }
                },
                PipelineState::Done { converted, outcome } => {
                    let quality = self.report_quality(&converted).await;
                    info!("Conversion of {} {}", input.file_name(), outcome);
                    return Ok(ConvertResponse {
                        output_file: converted,
                        outcome,
                        quality,
                    });
                }
            };
        }
    }

    /// Run one transcoder pass and pair the result with its provenance
    async fn run_pass(&self, plan: ConversionPlan, output_path: &Path) -> Result<ConvertedVideoFile, DomainError> {
        self.transcode_port.transcode(&plan.ffmpeg_args).await?;
        let file = VideoFile::open(output_path, self.probe_port.as_ref()).await?;
        ConvertedVideoFile::new(Arc::new(file), plan.stream_sources)
    }

    /// Atomically replace the first-pass output with the repaired file
    async fn promote(repaired: &ConvertedVideoFile, output_path: &Path) -> Result<ConvertedVideoFile, DomainError> {
        tokio::fs::rename(repaired.path(), output_path).await.map_err(|e| {
            DomainError::FsFail(format!(
                "Failed to move {} to {}: {}",
                repaired.path().display(),
                output_path.display(),
                e
            ))
        })?;
        info!("Replaced {} with the repaired file", output_path.display());
        repaired.relocated(output_path)
    }

    /// Measure every re-encoded stream; failures are only logged
    async fn report_quality(&self, converted: &ConvertedVideoFile) -> QualityReport {
        let mut report = QualityReport::new();

        for (output_index, (_, source)) in converted.stream_with_sources().enumerate() {
            if source.transformation_kind() != TransformationKind::ReEncoded {
                continue;
            }
            let result = self
                .quality_port
                .audio_quality(
                    source.source_video_file().path(),
                    source.source_stream_index(),
                    converted.path(),
                    output_index,
                )
                .await;
            match result {
                Ok(metrics) if !metrics.is_empty() => {
                    info!("Audio quality of output stream {}: {}", output_index, metrics);
                    report.insert(output_index, metrics);
                }
                Ok(_) => warn!("No quality metrics reported for output stream {}", output_index),
                Err(e) => warn!("Could not measure quality of output stream {}: {}", output_index, e),
            }
        }
        report
    }
}

