use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::adapters::{AppConfig, FFmpegAdapter, FFmpegHashAdapter, FFmpegQualityAdapter, FFprobeAdapter};
use crate::app::{convert_interactor::ConvertInteractor, inspect_interactor::InspectInteractor};
use crate::error::{Ts2Mp4Error, Ts2Mp4Result};
use crate::output::CachedStreamHasher;
use crate::ports::{ProbePort, QualityMetricsPort, StreamHashPort, TranscodePort};

pub trait AppContainer: Send + Sync {
    /// An interactor for one conversion, with its own digest cache
    fn convert_interactor(&self) -> Arc<ConvertInteractor>;
    fn inspect_interactor(&self) -> Arc<InspectInteractor>;
}

pub struct DefaultAppContainer {
    probe_port: Arc<dyn ProbePort>,
    transcode_port: Arc<dyn TranscodePort>,
    hash_port: Arc<dyn StreamHashPort>,
    quality_port: Arc<dyn QualityMetricsPort>,
}

impl DefaultAppContainer {
    pub fn new(config: &AppConfig) -> Ts2Mp4Result<Self> {
        let ffmpeg = resolve_tool(&config.ffmpeg)?;
        let ffprobe = resolve_tool(&config.ffprobe)?;

        Ok(Self::from_ports(
            Arc::new(FFprobeAdapter::new(ffprobe)),
            Arc::new(FFmpegAdapter::new(ffmpeg.clone())),
            Arc::new(FFmpegHashAdapter::new(ffmpeg.clone())),
            Arc::new(FFmpegQualityAdapter::new(ffmpeg)?),
        ))
    }

    fn from_ports(
        probe_port: Arc<dyn ProbePort>,
        transcode_port: Arc<dyn TranscodePort>,
        hash_port: Arc<dyn StreamHashPort>,
        quality_port: Arc<dyn QualityMetricsPort>,
    ) -> Self {
        Self {
            probe_port,
            transcode_port,
            hash_port,
            quality_port,
        }
    }

    /// A fresh digest cache over the shared hasher, dropped with its conversion
    fn conversion_hasher(&self) -> Arc<CachedStreamHasher> {
        Arc::new(CachedStreamHasher::new(Arc::clone(&self.hash_port)))
    }
}

impl AppContainer for DefaultAppContainer {
    fn convert_interactor(&self) -> Arc<ConvertInteractor> {
        Arc::new(ConvertInteractor::new(
            Arc::clone(&self.probe_port),
            Arc::clone(&self.transcode_port),
            self.conversion_hasher() as Arc<dyn StreamHashPort>,
            Arc::clone(&self.quality_port),
        ))
    }

    fn inspect_interactor(&self) -> Arc<InspectInteractor> {
        Arc::new(InspectInteractor::new(Arc::clone(&self.probe_port)))
    }
}

/// Look a tool up on `PATH`, or check an explicit path
fn resolve_tool(tool: &Path) -> Ts2Mp4Result<PathBuf> {
    let resolved = which::which(tool).map_err(|_| Ts2Mp4Error::ToolNotFound {
        tool: tool.display().to_string(),
    })?;
    debug!("Using {} at {}", tool.display(), resolved.display());
    Ok(resolved)
}
