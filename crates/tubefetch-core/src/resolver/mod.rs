//! Resolver interface: URL in, stream catalog out, plus the byte transfer of a chosen stream.
//!
//! The job pipeline depends only on this trait; yt-dlp is one implementation.

mod parse;
mod ytdlp;

pub use parse::parse_catalog;
pub use ytdlp::YtDlpResolver;

use crate::catalog::{StreamCatalog, StreamDescriptor};
use crate::error::{JobError, JobResult};
use std::path::Path;

pub trait Resolver {
    /// Enumerate the streams available for `url`.
    fn resolve(&self, url: &str) -> JobResult<StreamCatalog>;

    /// Download `stream` to `dest`, returning the number of bytes written.
    fn download(&self, stream: &StreamDescriptor, dest: &Path) -> JobResult<u64>;
}

/// Rejects anything that is not an absolute http(s) URL before a resolver is spawned.
pub fn validate_url(input: &str) -> JobResult<url::Url> {
    let trimmed = input.trim();
    let parsed = url::Url::parse(trimmed)
        .map_err(|e| JobError::InvalidUrl(format!("{trimmed}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed),
        _ => Err(JobError::InvalidUrl(trimmed.to_string())),
    }
}
