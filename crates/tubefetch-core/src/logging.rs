//! Logging setup.
//!
//! Logs go to a file so they never interleave with the interactive prompts.
//! Only when that file cannot be opened do they go to stderr, and then at
//! `warn` unless `RUST_LOG` says otherwise.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Filter for the file log when `RUST_LOG` is unset.
pub const FILE_FILTER: &str = "info,tubefetch=debug,tubefetch_core=debug";
/// Filter for the stderr fallback when `RUST_LOG` is unset.
pub const STDERR_FILTER: &str = "warn";

/// `~/.local/state/tubefetch/tubefetch.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tubefetch")?;
    Ok(xdg_dirs.get_state_home().join("tubefetch").join("tubefetch.log"))
}

/// Log to [`log_file_path`]. Errors if the file cannot be opened, so the
/// caller can fall back to [`init_logging_stderr`].
pub fn init_logging() -> Result<()> {
    let path = log_file_path()?;
    let log = LogFile::open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(FILE_FILTER))
        .with_writer(log)
        .with_ansi(false)
        .init();

    tracing::info!("tubefetch logging to {}", path.display());
    Ok(())
}

/// Log to stderr only.
pub fn init_logging_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(STDERR_FILTER))
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Append-only log file shared by every event.
struct LogFile(File);

impl LogFile {
    fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        Ok(Self(file))
    }
}

/// Per-event handle: a clone of the log file, or stderr if the clone fails.
enum LogWriter {
    File(File),
    Stderr(io::Stderr),
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogWriter::File(f) => f.write(buf),
            LogWriter::Stderr(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogWriter::File(f) => f.flush(),
            LogWriter::Stderr(e) => e.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        match self.0.try_clone() {
            Ok(f) => LogWriter::File(f),
            Err(_) => LogWriter::Stderr(io::stderr()),
        }
    }
}
