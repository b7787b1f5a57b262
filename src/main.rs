//! ts2mp4 - MPEG transport stream to MP4 converter
//!
//! # Usage
//!
//! ```bash
//! ts2mp4 convert recording.ts
//! ts2mp4 convert recordings/ --crf 20 --preset slow
//! ts2mp4 inspect recording.ts --json
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use ts2mp4::adapters::TracingLogAdapter;
use ts2mp4::cli::{commands, Cli, Commands};
use ts2mp4::config_initialization::initialize_configuration_hierarchy;

/// Main entry point for the ts2mp4 CLI application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let config = initialize_configuration_hierarchy(&cli)?;
    let logger = TracingLogAdapter::init(&config.log_level)?;

    info!("Starting ts2mp4 {}", env!("CARGO_PKG_VERSION"));

    // Execute the requested command
    let result = match cli.command {
        Commands::Convert(args) => commands::convert(args, &config, &logger).await,
        Commands::Inspect(args) => commands::inspect(args, &config).await,
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
