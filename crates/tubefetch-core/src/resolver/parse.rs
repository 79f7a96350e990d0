//! yt-dlp `-J` payload to [`StreamCatalog`].

use crate::catalog::{Container, Resolution, StreamCatalog, StreamDescriptor, StreamKind};
use crate::error::{JobError, JobResult};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
struct Payload {
    title: Option<String>,
    #[serde(default)]
    formats: Vec<Format>,
}

#[derive(Debug, Deserialize)]
struct Format {
    format_id: Option<String>,
    ext: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    height: Option<u32>,
    abr: Option<f64>,
    url: Option<String>,
    protocol: Option<String>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
}

/// Parses a yt-dlp JSON info dict.
///
/// Keeps only formats that can be fetched with one plain GET (`http`/`https`
/// protocol with a URL) and that carry at least one of audio or video.
pub fn parse_catalog(json: &[u8]) -> JobResult<StreamCatalog> {
    let payload: Payload =
        serde_json::from_slice(json).map_err(|e| JobError::MalformedCatalog(e.to_string()))?;

    let streams = payload
        .formats
        .into_iter()
        .filter_map(descriptor_from_format)
        .collect();

    Ok(StreamCatalog::new(
        payload.title.unwrap_or_else(|| "video".to_string()),
        streams,
    ))
}

fn descriptor_from_format(f: Format) -> Option<StreamDescriptor> {
    let id = f.format_id?.trim().to_string();
    if id.is_empty() {
        return None;
    }
    let url = f.url.filter(|u| !u.is_empty())?;
    match f.protocol.as_deref() {
        Some("http") | Some("https") | None => {}
        Some(other) => {
            tracing::trace!(id = %id, protocol = other, "skipping non-direct format");
            return None;
        }
    }

    let has_video = has_codec(f.vcodec.as_deref());
    let has_audio = has_codec(f.acodec.as_deref());
    let kind = match (has_video, has_audio) {
        (true, true) => StreamKind::Progressive,
        (true, false) => StreamKind::VideoOnly,
        (false, true) => StreamKind::AudioOnly,
        (false, false) => return None,
    };

    let resolution = match kind {
        StreamKind::AudioOnly => None,
        _ => f.height.filter(|h| *h > 0).map(Resolution),
    };
    let abr = match kind {
        StreamKind::VideoOnly => None,
        _ => f.abr.filter(|a| a.is_finite() && *a > 0.0),
    };

    Some(StreamDescriptor {
        id,
        container: Container::from_ext(f.ext.as_deref().unwrap_or("")),
        kind,
        resolution,
        abr,
        url,
        headers: f.http_headers,
    })
}

fn has_codec(codec: Option<&str>) -> bool {
    matches!(codec, Some(c) if !c.is_empty() && c != "none")
}
