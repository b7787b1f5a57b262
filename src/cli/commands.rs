//! Command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info};
use walkdir::WalkDir;

use crate::adapters::{AppConfig, TracingLogAdapter};
use crate::app::container::{AppContainer, DefaultAppContainer};
use crate::app::inspect_interactor::InspectInteractor;
use crate::cli::args::{ConvertArgs, InspectArgs};
use crate::domain::usecases::{ConvertRequest, InspectRequest};
use crate::error::{Ts2Mp4Error, Ts2Mp4Result};
use crate::utils::PathUtils;

/// Execute the convert command
pub async fn convert(args: ConvertArgs, config: &AppConfig, logger: &TracingLogAdapter) -> Result<()> {
    let inputs = collect_inputs(&args.path)?;
    if inputs.len() > 1 && args.output.is_some() {
        return Err(Ts2Mp4Error::Config {
            message: "--output cannot be used when converting a directory".to_string(),
        }
        .into());
    }

    let container = DefaultAppContainer::new(config)?;
    let options = config.encoding_options()?;

    let mut failed = Vec::new();
    for input in &inputs {
        let log_path = args
            .log_file
            .clone()
            .unwrap_or_else(|| PathUtils::default_log_path(input, chrono::Local::now()));
        logger.begin_conversion_log(&log_path, input)?;

        let output = args
            .output
            .clone()
            .unwrap_or_else(|| PathUtils::default_output_path(input));

        let result = async {
            let request = ConvertRequest::new(input.clone(), output, options.clone())?;
            container.convert_interactor().execute(request).await
        }
        .await;

        match result {
            Ok(response) => {
                info!("Conversion completed: {}", response.output_file.path().display());
                println!("{}: {}", response.output_file.path().display(), response.outcome);
            }
            Err(e) => {
                error!("Conversion of {} failed: {}", input.display(), e);
                failed.push((input.clone(), e));
            }
        }
        logger.end_conversion_log();
    }

    match failed.len() {
        0 => Ok(()),
        1 if inputs.len() == 1 => {
            let (input, e) = failed.remove(0);
            Err(e).with_context(|| format!("Failed to convert {}", input.display()))
        }
        n => Err(anyhow::anyhow!("{} of {} conversions failed", n, inputs.len())),
    }
}

/// Execute the inspect command
pub async fn inspect(args: InspectArgs, config: &AppConfig) -> Result<()> {
    if !args.file.is_file() {
        return Err(Ts2Mp4Error::InputFileNotFound {
            path: args.file.display().to_string(),
        }
        .into());
    }

    let container = DefaultAppContainer::new(config)?;
    let response = container
        .inspect_interactor()
        .execute(InspectRequest {
            input_file: args.file.clone(),
        })
        .await
        .with_context(|| format!("Failed to inspect {}", args.file.display()))?;

    if args.json {
        println!("{}", InspectInteractor::format_as_json(&response)?);
    } else {
        print!("{}", InspectInteractor::format_as_text(&response));
    }
    Ok(())
}

/// The input file itself, or the .ts files directly inside a directory in name order
fn collect_inputs(path: &Path) -> Ts2Mp4Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(Ts2Mp4Error::InputFileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut inputs = Vec::new();
    for entry in WalkDir::new(path).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| Ts2Mp4Error::IoError(e.into()))?;
        if entry.file_type().is_file() && PathUtils::is_transport_stream(entry.path()) {
            inputs.push(entry.into_path());
        }
    }

    if inputs.is_empty() {
        return Err(Ts2Mp4Error::NoInputFiles {
            path: path.display().to_string(),
        });
    }
    info!("Found {} .ts files in {}", inputs.len(), path.display());
    Ok(inputs)
}
