//! yt-dlp backed resolver.

use super::{parse_catalog, validate_url, Resolver};
use crate::catalog::{StreamCatalog, StreamDescriptor};
use crate::error::{JobError, JobResult};
use crate::fetch;
use std::path::Path;
use std::process::Command;

/// Queries `yt-dlp -J` for the catalog and fetches streams over HTTP directly.
#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    binary: String,
}

impl YtDlpResolver {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

impl Resolver for YtDlpResolver {
    fn resolve(&self, url: &str) -> JobResult<StreamCatalog> {
        let url = validate_url(url)?;
        tracing::info!(url = %url, "resolving streams");

        let output = Command::new(&self.binary)
            .arg("-J")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg("--skip-download")
            .arg(url.as_str())
            .output()
            .map_err(|e| JobError::ResolverUnavailable {
                binary: self.binary.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(status = %output.status, "yt-dlp failed: {}", stderr.trim());
            return Err(classify_failure(&stderr));
        }

        let catalog = parse_catalog(&output.stdout)?;
        tracing::debug!(
            title = %catalog.title,
            streams = catalog.streams.len(),
            "catalog resolved"
        );
        Ok(catalog)
    }

    fn download(&self, stream: &StreamDescriptor, dest: &Path) -> JobResult<u64> {
        tracing::info!(id = %stream.id, dest = %dest.display(), "downloading stream");
        fetch::fetch_to_path(&stream.url, &stream.headers, dest)
    }
}

/// Maps yt-dlp diagnostics to an error kind, keeping the last meaningful line as the message.
fn classify_failure(stderr: &str) -> JobError {
    let message = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .unwrap_or("yt-dlp failed")
        .to_string();
    let lower = stderr.to_ascii_lowercase();
    let url_problem = lower.contains("unsupported url")
        || lower.contains("is not a valid url")
        || lower.contains("incomplete youtube id")
        || lower.contains("video unavailable");
    if url_problem {
        JobError::InvalidUrl(message)
    } else {
        JobError::Network(message)
    }
}
