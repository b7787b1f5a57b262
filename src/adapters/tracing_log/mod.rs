// Tracing log adapter - Subscriber setup with a stderr layer and a per-conversion log file

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Ts2Mp4Error, Ts2Mp4Result};

/// Log file target that can be redirected between conversions.
///
/// Writes are dropped while no file is open.
#[derive(Clone, Default)]
pub struct LogFileHandle {
    file: Arc<Mutex<Option<File>>>,
}

impl LogFileHandle {
    /// Send subsequent log lines to `path`, appending if it exists
    pub fn open(&self, path: &Path) -> Ts2Mp4Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut current = self.file.lock().map_err(|_| Ts2Mp4Error::Logging {
            message: "log file lock poisoned".to_string(),
        })?;
        if let Some(previous) = current.as_mut() {
            previous.flush()?;
        }
        *current = Some(file);
        Ok(())
    }

    /// Flush and stop writing to the current file
    pub fn close(&self) {
        if let Ok(mut current) = self.file.lock() {
            if let Some(mut file) = current.take() {
                let _ = file.flush();
            }
        }
    }
}

impl Write for LogFileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.file.lock() {
            Ok(mut current) => match current.as_mut() {
                Some(file) => file.write(buf),
                None => Ok(buf.len()),
            },
            Err(_) => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.lock() {
            Ok(mut current) => current.as_mut().map_or(Ok(()), |f| f.flush()),
            Err(_) => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFileHandle {
    type Writer = LogFileHandle;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Tracing log adapter
pub struct TracingLogAdapter {
    log_file: LogFileHandle,
}

impl TracingLogAdapter {
    /// Install the global subscriber.
    ///
    /// `RUST_LOG` takes precedence over `level`.
    pub fn init(level: &str) -> Ts2Mp4Result<Self> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| Ts2Mp4Error::Logging {
                message: format!("invalid log filter {}: {}", level, e),
            })?;

        let log_file = LogFileHandle::default();

        let console_layer = fmt::layer().with_writer(io::stderr).with_target(false);
        let file_layer = fmt::layer()
            .with_writer(log_file.clone())
            .with_ansi(false)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .map_err(|e| Ts2Mp4Error::Logging {
                message: e.to_string(),
            })?;

        Ok(Self { log_file })
    }

    /// Start a conversion log at `path` with its banner
    pub fn begin_conversion_log(&self, path: &Path, input: &Path) -> Ts2Mp4Result<()> {
        self.log_file.open(path)?;
        info!(
            "Conversion Log: {} (ts2mp4 {}, started {})",
            input.display(),
            env!("CARGO_PKG_VERSION"),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        info!("Writing log to {}", path.display());
        Ok(())
    }

    pub fn end_conversion_log(&self) {
        self.log_file.close();
    }
}
