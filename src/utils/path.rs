//! Path derivation for outputs, temporary files and logs

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Suffix of the repair pass output before it replaces the final file
pub const TEMP_SUFFIX: &str = ".temp";

/// Path helpers for conversion outputs
pub struct PathUtils;

impl PathUtils {
    /// `<dir>/<stem>.mp4` next to the input
    pub fn default_output_path(input: &Path) -> PathBuf {
        input.with_extension("mp4")
    }

    /// `<output>.temp`, in the same directory so the final rename stays atomic
    pub fn temp_output_path(output: &Path) -> PathBuf {
        let mut name: OsString = output.as_os_str().to_owned();
        name.push(TEMP_SUFFIX);
        PathBuf::from(name)
    }

    /// `<dir>/<stem>-YYYYmmddHHMMSS.log` next to the input
    pub fn default_log_path(input: &Path, now: DateTime<Local>) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ts2mp4".to_string());
        let file_name = format!("{}-{}.log", stem, now.format("%Y%m%d%H%M%S"));
        match input.parent() {
            Some(parent) => parent.join(file_name),
            None => PathBuf::from(file_name),
        }
    }

    /// Whether the file has a `.ts` extension, in any case
    pub fn is_transport_stream(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.eq_ignore_ascii_case("ts"))
            .unwrap_or(false)
    }
}
