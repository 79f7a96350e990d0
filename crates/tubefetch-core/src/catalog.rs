//! Stream catalog: the typed view of what the resolver says is downloadable.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Container of a single stream, taken from the resolver's file extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Container {
    Mp4,
    M4a,
    Webm,
    Other(String),
}

impl Container {
    pub fn from_ext(ext: &str) -> Self {
        match ext.trim().to_ascii_lowercase().as_str() {
            "mp4" => Container::Mp4,
            "m4a" => Container::M4a,
            "webm" => Container::Webm,
            other => Container::Other(other.to_string()),
        }
    }

    /// File extension without the dot.
    pub fn ext(&self) -> &str {
        match self {
            Container::Mp4 => "mp4",
            Container::M4a => "m4a",
            Container::Webm => "webm",
            Container::Other(ext) => ext,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Audio and video muxed together.
    Progressive,
    /// Adaptive video track without audio.
    VideoOnly,
    /// Adaptive audio track.
    AudioOnly,
}

/// Vertical resolution of a video stream, shown as `"720p"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Resolution(pub u32);

impl Resolution {
    pub fn height(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResolutionError(String);

impl fmt::Display for ParseResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a resolution: {:?}", self.0)
    }
}

impl std::error::Error for ParseResolutionError {}

impl FromStr for Resolution {
    type Err = ParseResolutionError;

    /// Accepts `720p`, `720P` or a bare `720`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let digits = t
            .strip_suffix('p')
            .or_else(|| t.strip_suffix('P'))
            .unwrap_or(t);
        match digits.parse::<u32>() {
            Ok(h) if h > 0 => Ok(Resolution(h)),
            _ => Err(ParseResolutionError(s.to_string())),
        }
    }
}

/// One downloadable stream. Immutable once the resolver produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    /// Resolver-specific format id.
    pub id: String,
    pub container: Container,
    pub kind: StreamKind,
    pub resolution: Option<Resolution>,
    /// Audio bitrate in kbit/s.
    pub abr: Option<f64>,
    /// Direct media URL.
    pub url: String,
    /// Headers the resolver requires on the GET.
    pub headers: HashMap<String, String>,
}

impl StreamDescriptor {
    pub fn is_progressive(&self) -> bool {
        self.kind == StreamKind::Progressive
    }

    pub fn is_video_only(&self) -> bool {
        self.kind == StreamKind::VideoOnly
    }

    pub fn is_audio_only(&self) -> bool {
        self.kind == StreamKind::AudioOnly
    }

    /// Short human label used in progress lines: resolution for video, bitrate for audio.
    pub fn label(&self) -> String {
        match (self.resolution, self.abr) {
            (Some(r), _) if !self.is_audio_only() => r.to_string(),
            (_, Some(abr)) => format!("{:.0}kbps", abr),
            _ => self.id.clone(),
        }
    }
}

/// Everything the resolver returned for one URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamCatalog {
    pub title: String,
    pub streams: Vec<StreamDescriptor>,
}

impl StreamCatalog {
    pub fn new(title: impl Into<String>, streams: Vec<StreamDescriptor>) -> Self {
        Self {
            title: title.into(),
            streams,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter()
    }
}
