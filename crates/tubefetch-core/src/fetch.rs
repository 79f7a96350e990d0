//! Single-stream HTTP GET of a resolved media URL.
//!
//! Writes the response body sequentially to a local file. No Range requests,
//! no retries: a failed transfer surfaces immediately.

use crate::error::{JobError, JobResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Downloads `url` with a single GET, writing to `dest` (created or truncated).
/// Returns the number of bytes written.
pub fn fetch_to_path(url: &str, headers: &HashMap<String, String>, dest: &Path) -> JobResult<u64> {
    let file = File::create(dest)
        .map_err(|e| JobError::filesystem("failed to create", dest, e))?;
    let sink = RefCell::new(Sink {
        out: BufWriter::new(file),
        written: 0,
        error: None,
    });

    let mut easy = curl::easy::Easy::new();
    easy.url(url)
        .map_err(|e| JobError::InvalidUrl(format!("{url}: {e}")))?;
    configure(&mut easy, headers).map_err(curl_error)?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                let mut sink = sink.borrow_mut();
                match sink.out.write_all(data) {
                    Ok(()) => {
                        sink.written += data.len() as u64;
                        Ok(data.len())
                    }
                    Err(e) => {
                        sink.error = Some(e);
                        Ok(0) // abort transfer
                    }
                }
            })
            .map_err(curl_error)?;
        transfer.perform()
    };

    let mut sink = sink.into_inner();
    if let Some(e) = sink.error.take() {
        return Err(JobError::filesystem("failed to write", dest, e));
    }
    performed.map_err(curl_error)?;

    let code = easy.response_code().map_err(curl_error)?;
    if !(200..300).contains(&code) {
        return Err(JobError::Network(format!("GET returned HTTP {code}")));
    }

    sink.out
        .flush()
        .map_err(|e| JobError::filesystem("failed to write", dest, e))?;
    tracing::debug!(bytes = sink.written, dest = %dest.display(), "stream fetched");
    Ok(sink.written)
}

struct Sink {
    out: BufWriter<File>,
    written: u64,
    error: Option<io::Error>,
}

fn configure(
    easy: &mut curl::easy::Easy,
    headers: &HashMap<String, String>,
) -> Result<(), curl::Error> {
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(Duration::from_secs(30))?;

    let mut list = curl::easy::List::new();
    for (k, v) in headers {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    if !headers.is_empty() {
        easy.http_headers(list)?;
    }
    Ok(())
}

fn curl_error(e: curl::Error) -> JobError {
    JobError::Network(e.to_string())
}
