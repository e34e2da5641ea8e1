//! Access log with size-based rotation.
//!
//! # Responsibilities
//! - Append one timestamped record per connection outcome
//! - Rotate the file to `<path>.1` once it reaches the size cap
//! - Never fail a connection over a logging problem
//!
//! # Design Decisions
//! - A std mutex guards the file handle; writes are short and never await
//! - Timestamps are local time in `YYYY-MM-DD HH:MM:SS` form

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Local;

/// Append-only log of connection outcomes.
pub struct AccessLog {
    inner: Option<Mutex<LogFile>>,
}

struct LogFile {
    file: Option<File>,
    path: PathBuf,
    max_size: u64,
}

impl AccessLog {
    /// Open (or create) the log file at `path`, rotating at `max_size`.
    ///
    /// A failure to open leaves the log silently disabled rather than
    /// failing startup.
    pub fn open(path: impl Into<PathBuf>, max_size: u64) -> Self {
        let path = path.into();
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let file = match open_append(&path) {
            Ok(file) => Some(file),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "Failed to open access log");
                None
            }
        };
        Self {
            inner: Some(Mutex::new(LogFile {
                file,
                path,
                max_size,
            })),
        }
    }

    /// A no-op log for configurations with access logging disabled.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Append a record. Fire-and-forget: errors are swallowed.
    pub fn log(&self, message: &str) {
        let Some(inner) = &self.inner else { return };
        let Ok(mut log) = inner.lock() else { return };
        log.rotate_if_needed();
        if let Some(file) = log.file.as_mut() {
            let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
            let _ = writeln!(file, "[{}] {}", stamp, message);
        }
    }
}

impl LogFile {
    fn rotate_if_needed(&mut self) {
        let size = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(_) => return,
        };
        if size < self.max_size {
            return;
        }

        self.file = None;
        let mut rotated = OsString::from(self.path.as_os_str());
        rotated.push(".1");
        let rotated = PathBuf::from(rotated);
        let _ = fs::remove_file(&rotated);
        let _ = fs::rename(&self.path, &rotated);
        self.file = open_append(&self.path).ok();
    }
}

fn open_append(path: &PathBuf) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
