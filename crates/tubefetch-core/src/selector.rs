//! Stream selection: pure filter/sort over a [`StreamCatalog`].

use crate::catalog::{Container, Resolution, StreamCatalog, StreamDescriptor};
use crate::config::Mp4Mode;
use crate::error::{JobError, JobResult};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Mp4,
    Mp3,
}

impl OutputFormat {
    pub fn ext(self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ext())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(OutputFormat::Mp4),
            "mp3" => Ok(OutputFormat::Mp3),
            other => Err(format!("unsupported format {other:?}; use mp4 or mp3")),
        }
    }
}

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionCriteria {
    pub format: OutputFormat,
    /// Only consulted for [`OutputFormat::Mp4`].
    pub mp4_mode: Mp4Mode,
}

impl SelectionCriteria {
    pub fn mp3() -> Self {
        Self {
            format: OutputFormat::Mp3,
            mp4_mode: Mp4Mode::Adaptive,
        }
    }

    pub fn mp4(mode: Mp4Mode) -> Self {
        Self {
            format: OutputFormat::Mp4,
            mp4_mode: mode,
        }
    }

    /// Whether this request ends with an ffmpeg invocation.
    pub fn needs_transcoder(&self) -> bool {
        !matches!(
            (self.format, self.mp4_mode),
            (OutputFormat::Mp4, Mp4Mode::Progressive)
        )
    }
}

/// Streams picked for one job.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// One muxed stream, saved as is.
    Progressive(StreamDescriptor),
    /// Video and audio tracks to be merged.
    Adaptive {
        video: StreamDescriptor,
        audio: StreamDescriptor,
    },
    /// One audio track to be converted to MP3.
    Audio(StreamDescriptor),
}

/// Picks one resolution out of the available set.
pub trait ResolutionChooser {
    /// `available` is non-empty and sorted descending.
    fn choose(&mut self, available: &[Resolution]) -> JobResult<Resolution>;
}

/// Non-interactive chooser: a single validation, failing with the valid set.
#[derive(Debug, Clone, Copy)]
pub struct FixedResolution(pub Resolution);

impl ResolutionChooser for FixedResolution {
    fn choose(&mut self, available: &[Resolution]) -> JobResult<Resolution> {
        if available.contains(&self.0) {
            Ok(self.0)
        } else {
            Err(JobError::ResolutionUnavailable {
                requested: self.0.to_string(),
                available: join_resolutions(available),
            })
        }
    }
}

/// `"1080p, 720p, 480p"`.
pub fn join_resolutions(resolutions: &[Resolution]) -> String {
    resolutions
        .iter()
        .map(|r| r.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_adaptive_mp4_video(s: &StreamDescriptor) -> bool {
    s.is_video_only() && s.container == Container::Mp4
}

/// Resolutions of adaptive MP4 video tracks, deduplicated, highest first.
pub fn available_resolutions(catalog: &StreamCatalog) -> Vec<Resolution> {
    let set: BTreeSet<Resolution> = catalog
        .iter()
        .filter(|s| is_adaptive_mp4_video(s))
        .filter_map(|s| s.resolution)
        .collect();
    set.into_iter().rev().collect()
}

/// Highest-resolution progressive stream in `container`. Streams without a height rank lowest.
pub fn best_progressive<'a>(
    catalog: &'a StreamCatalog,
    container: &Container,
) -> Option<&'a StreamDescriptor> {
    catalog
        .iter()
        .filter(|s| s.is_progressive() && &s.container == container)
        .max_by_key(|s| s.resolution)
}

/// First adaptive MP4 video track at exactly `resolution`.
pub fn video_for_resolution(
    catalog: &StreamCatalog,
    resolution: Resolution,
) -> Option<&StreamDescriptor> {
    catalog
        .iter()
        .find(|s| is_adaptive_mp4_video(s) && s.resolution == Some(resolution))
}

/// Audio-only track with the highest abr, any container. Ties keep catalog order.
pub fn best_audio(catalog: &StreamCatalog) -> Option<&StreamDescriptor> {
    catalog
        .iter()
        .filter(|s| s.is_audio_only())
        .fold(None, |best: Option<&StreamDescriptor>, s| match best {
            Some(b) if b.abr.unwrap_or(0.0) >= s.abr.unwrap_or(0.0) => Some(b),
            _ => Some(s),
        })
}

/// Applies `criteria` to `catalog`. The chooser is only consulted for adaptive MP4.
pub fn choose_format(
    catalog: &StreamCatalog,
    criteria: &SelectionCriteria,
    chooser: &mut dyn ResolutionChooser,
) -> JobResult<Selection> {
    match (criteria.format, criteria.mp4_mode) {
        (OutputFormat::Mp4, Mp4Mode::Progressive) => best_progressive(catalog, &Container::Mp4)
            .cloned()
            .map(Selection::Progressive)
            .ok_or(JobError::NoSuitableStream("progressive mp4")),
        (OutputFormat::Mp4, Mp4Mode::Adaptive) => {
            let available = available_resolutions(catalog);
            if available.is_empty() {
                return Err(JobError::NoSuitableStream("video"));
            }
            let resolution = chooser.choose(&available)?;
            let video = video_for_resolution(catalog, resolution).ok_or_else(|| {
                JobError::ResolutionUnavailable {
                    requested: resolution.to_string(),
                    available: join_resolutions(&available),
                }
            })?;
            let audio = best_audio(catalog).ok_or(JobError::NoSuitableStream("audio"))?;
            Ok(Selection::Adaptive {
                video: video.clone(),
                audio: audio.clone(),
            })
        }
        (OutputFormat::Mp3, _) => best_audio(catalog)
            .cloned()
            .map(Selection::Audio)
            .ok_or(JobError::NoSuitableStream("audio")),
    }
}
