//! Job error taxonomy.
//!
//! Every failure a download job can hit maps to exactly one variant. The CLI
//! renders them once at the job boundary; nothing below it prints.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    /// The input is not a URL the resolver can work with.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Resolver or media transfer failed on the network side.
    #[error("network error: {0}")]
    Network(String),

    /// The resolver binary could not be started.
    #[error("{binary} could not be started ({reason}); install it or set ytdlp_path in the config")]
    ResolverUnavailable { binary: String, reason: String },

    /// The resolver answered with something we could not read as a catalog.
    #[error("could not read stream catalog: {0}")]
    MalformedCatalog(String),

    /// Filtering left nothing to download.
    #[error("no suitable {0} stream found")]
    NoSuitableStream(&'static str),

    #[error("resolution {requested} is not available; choose from: {available}")]
    ResolutionUnavailable { requested: String, available: String },

    #[error("{binary} is not installed or not in PATH ({reason})")]
    TranscoderUnavailable { binary: String, reason: String },

    /// ffmpeg exited non-zero; `stderr` is its diagnostic output verbatim.
    #[error("transcoder failed ({status}): {stderr}")]
    TranscoderFailed { status: ExitStatus, stderr: String },

    #[error("{action} {}: {source}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the answer to a prompt failed.
    #[error("console I/O failed: {0}")]
    Console(#[source] io::Error),

    #[error("operation cancelled by user")]
    Cancelled,
}

impl JobError {
    pub fn filesystem(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Filesystem {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type JobResult<T> = Result<T, JobError>;
