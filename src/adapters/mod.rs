// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod hash_ffmpeg;
pub mod probe_ffprobe;
pub mod quality_ffmpeg;
pub mod toml_config;
pub mod tracing_log;

// Re-export adapters
pub use exec_ffmpeg::FFmpegAdapter;
pub use hash_ffmpeg::FFmpegHashAdapter;
pub use probe_ffprobe::FFprobeAdapter;
pub use quality_ffmpeg::FFmpegQualityAdapter;
pub use toml_config::{AppConfig, TomlConfigAdapter};
pub use tracing_log::TracingLogAdapter;
