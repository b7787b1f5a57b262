//! Configuration initialization and hierarchy management

use tracing::debug;

use crate::adapters::{AppConfig, TomlConfigAdapter};
use crate::cli::{Cli, Commands};
use crate::error::{Ts2Mp4Error, Ts2Mp4Result};

/// Resolve configuration following precedence: CLI > Env > File > Defaults.
///
/// Environment values arrive through clap, so every `Some` on `cli`
/// already reflects the two highest layers.
pub fn initialize_configuration_hierarchy(cli: &Cli) -> Ts2Mp4Result<AppConfig> {
    let mut config = TomlConfigAdapter::load(cli.config.as_deref()).map_err(|e| Ts2Mp4Error::Config {
        message: e.to_string(),
    })?;

    apply_cli_configuration_overrides(&mut config, cli);

    config.validate().map_err(|e| Ts2Mp4Error::Config {
        message: e.to_string(),
    })?;
    debug!("Resolved configuration: {:?}", config);
    Ok(config)
}

/// Apply CLI and environment overrides to configuration
fn apply_cli_configuration_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(ffmpeg) = &cli.ffmpeg {
        config.ffmpeg = ffmpeg.clone();
    }
    if let Some(ffprobe) = &cli.ffprobe {
        config.ffprobe = ffprobe.clone();
    }

    if let Commands::Convert(args) = &cli.command {
        if let Some(crf) = args.crf {
            config.crf = crf;
        }
        if let Some(preset) = &args.preset {
            config.preset = preset.clone();
        }
    }
}
