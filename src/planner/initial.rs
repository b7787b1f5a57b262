//! Initial TS to MP4 conversion plan

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::domain::usecases::EncodingOptions;
use crate::planner::{ConversionPlan, AAC_ADTS_TO_ASC, COMMON_ARGS};

/// Builds the first pass: video converted to HEVC, audio stream-copied
pub struct InitialPlanner {
    options: EncodingOptions,
}

impl InitialPlanner {
    pub fn new(options: EncodingOptions) -> Self {
        Self { options }
    }

    /// Plan the conversion of `input` into `output_path`.
    ///
    /// Missing video or audio surfaces from [`StreamSources`] construction.
    pub fn plan(&self, input: &Arc<VideoFile>, output_path: &Path) -> Result<ConversionPlan, DomainError> {
        let stream_sources = Self::build_stream_sources(input)?;
        let ffmpeg_args = self.build_ffmpeg_args(&stream_sources, input, output_path);

        info!(
            "Planned initial conversion of {} with {} output streams",
            input.file_name(),
            stream_sources.len()
        );

        Ok(ConversionPlan {
            stream_sources,
            ffmpeg_args,
        })
    }

    fn build_stream_sources(input: &Arc<VideoFile>) -> Result<StreamSources, DomainError> {
        let sources = input
            .valid_streams()
            .into_iter()
            .map(|stream| {
                let kind = if stream.is_video() {
                    TransformationKind::Converted
                } else {
                    TransformationKind::Copied
                };
                StreamSource::new(Arc::clone(input), stream.index, kind)
            })
            .collect::<Result<Vec<_>, _>>()?;

        StreamSources::for_initial_conversion(sources)
    }

    fn build_ffmpeg_args(
        &self,
        stream_sources: &StreamSources,
        input: &VideoFile,
        output_path: &Path,
    ) -> Vec<String> {
        let mut args: Vec<String> = COMMON_ARGS.iter().map(|a| a.to_string()).collect();
        args.push("-i".to_string());
        args.push(input.path().display().to_string());

        for source in stream_sources {
            args.push("-map".to_string());
            args.push(format!("0:{}", source.source_stream_index()));
        }

        args.extend(
            [
                "-f",
                "mp4",
                "-vsync",
                "1",
                "-vf",
                "bwdif",
                "-codec:v",
                "libx265",
                "-crf",
            ]
            .iter()
            .map(|a| a.to_string()),
        );
        args.push(self.options.crf.to_string());
        args.push("-preset".to_string());
        args.push(self.options.preset.clone());
        args.extend(
            ["-codec:a", "copy", "-bsf:a", AAC_ADTS_TO_ASC]
                .iter()
                .map(|a| a.to_string()),
        );
        args.push(output_path.display().to_string());
        args
    }
}
