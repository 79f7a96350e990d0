//! One download job: precheck, resolve, select, fetch, merge/convert, finalize, cleanup.
//!
//! Strictly sequential. Every scratch path is owned by a [`TempFile`] from the
//! moment the job decides to write it, so cleanup happens on every exit path.
//! Warnings from that cleanup go to the [`JobObserver`]; they never change
//! the job's outcome.

use crate::catalog::{Container, StreamDescriptor};
use crate::error::{JobError, JobResult};
use crate::naming;
use crate::resolver::Resolver;
use crate::selector::{choose_format, ResolutionChooser, Selection, SelectionCriteria};
use crate::temp::{remove_if_exists, CleanupWarning, TempFile};
use crate::transcoder::Transcoder;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Fixed scratch name for the video track (and for progressive downloads).
pub const VIDEO_TEMP_STEM: &str = "video_temp";
/// Fixed scratch name for the audio track; the stream's container supplies the extension.
pub const AUDIO_TEMP_STEM: &str = "audio_temp";

/// Inputs of a single job.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub url: String,
    pub criteria: SelectionCriteria,
    pub output_dir: PathBuf,
    /// Scratch paths currently held by the job; shared with an interrupt handler.
    pub scratch: ScratchRegistry,
}

impl DownloadJob {
    pub fn new(url: impl Into<String>, criteria: SelectionCriteria, output_dir: PathBuf) -> Self {
        Self {
            url: url.into(),
            criteria,
            output_dir,
            scratch: ScratchRegistry::default(),
        }
    }
}

/// Shared view of the scratch paths a running job may have written.
///
/// The job registers a path before writing it and releases it once it is
/// either deleted or kept as the final output. Another thread (a Ctrl-C
/// handler) can call [`ScratchRegistry::remove_all`] when the process is
/// about to exit without unwinding.
#[derive(Debug, Clone, Default)]
pub struct ScratchRegistry {
    paths: Arc<Mutex<Vec<PathBuf>>>,
}

impl ScratchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.paths.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `path` as scratch; the job calls this before writing it.
    pub fn register(&self, path: &Path) {
        self.lock().push(path.to_path_buf());
    }

    /// Forget `path` without touching the file.
    pub fn release(&self, path: &Path) {
        self.lock().retain(|p| p != path);
    }

    /// Paths registered and not yet released.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().clone()
    }

    /// Delete every registered path that still exists and forget them all.
    pub fn remove_all(&self) -> Vec<CleanupWarning> {
        let paths = std::mem::take(&mut *self.lock());
        paths
            .iter()
            .filter_map(|p| remove_if_exists(p).err())
            .collect()
    }
}

/// Stage transitions reported to the observer.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStage {
    Precheck,
    Resolve,
    Select,
    DownloadVideo { label: String },
    DownloadAudio { label: String },
    Merge,
    Convert,
    Finalize { path: PathBuf },
    Cleanup,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStage::Precheck => write!(f, "Checking for transcoder"),
            JobStage::Resolve => write!(f, "Fetching stream list"),
            JobStage::Select => write!(f, "Selecting streams"),
            JobStage::DownloadVideo { label } => write!(f, "Downloading video: {label}"),
            JobStage::DownloadAudio { label } => write!(f, "Downloading audio: {label}"),
            JobStage::Merge => write!(f, "Merging video and audio"),
            JobStage::Convert => write!(f, "Converting to mp3"),
            JobStage::Finalize { path } => write!(f, "Writing {}", path.display()),
            JobStage::Cleanup => write!(f, "Cleaning up"),
        }
    }
}

pub trait JobObserver {
    fn on_stage(&mut self, _stage: &JobStage) {}

    /// Non-fatal problem, e.g. a scratch file that could not be deleted.
    fn on_warning(&mut self, _message: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl JobObserver for SilentObserver {}

/// External collaborators of a job.
pub struct JobContext<'a> {
    pub resolver: &'a dyn Resolver,
    pub transcoder: &'a dyn Transcoder,
    pub chooser: &'a mut dyn ResolutionChooser,
    pub observer: &'a mut dyn JobObserver,
}

/// Runs `job` to completion and returns the final output path.
pub fn run_job(job: &DownloadJob, ctx: JobContext<'_>) -> JobResult<PathBuf> {
    let JobContext {
        resolver,
        transcoder,
        chooser,
        observer,
    } = ctx;
    let mut scratch = Scratch::new(job.scratch.clone());

    let result = run_stages(job, resolver, transcoder, chooser, observer, &mut scratch);

    if !scratch.is_empty() {
        observer.on_stage(&JobStage::Cleanup);
    }
    for warning in scratch.cleanup() {
        tracing::warn!("{}", warning);
        observer.on_warning(&warning);
    }

    match &result {
        Ok(path) => tracing::info!(output = %path.display(), "job completed"),
        Err(e) => tracing::warn!(error = %e, "job failed"),
    }
    result
}

fn run_stages(
    job: &DownloadJob,
    resolver: &dyn Resolver,
    transcoder: &dyn Transcoder,
    chooser: &mut dyn ResolutionChooser,
    observer: &mut dyn JobObserver,
    scratch: &mut Scratch,
) -> JobResult<PathBuf> {
    if job.criteria.needs_transcoder() {
        observer.on_stage(&JobStage::Precheck);
        transcoder.check_available()?;
    }
    fs::create_dir_all(&job.output_dir)
        .map_err(|e| JobError::filesystem("failed to create directory", &job.output_dir, e))?;

    observer.on_stage(&JobStage::Resolve);
    let catalog = resolver.resolve(&job.url)?;

    observer.on_stage(&JobStage::Select);
    let selection = choose_format(&catalog, &job.criteria, chooser)?;
    let final_path = output_path_for(&job.output_dir, &catalog.title, job.criteria.format.ext());
    tracing::debug!(?selection, final_path = %final_path.display(), "streams selected");

    match selection {
        Selection::Progressive(stream) => {
            let video = fetch_video(job, resolver, observer, scratch, &stream)?;
            observer.on_stage(&JobStage::Finalize {
                path: final_path.clone(),
            });
            fs::rename(video, &final_path)
                .map_err(|e| JobError::filesystem("failed to move download to", &final_path, e))?;
        }
        Selection::Adaptive { video, audio } => {
            let video_path = fetch_video(job, resolver, observer, scratch, &video)?;
            let audio_path = fetch_audio(job, resolver, observer, scratch, &audio)?;
            observer.on_stage(&JobStage::Merge);
            scratch.track(final_path.clone());
            transcoder.merge(&video_path, &audio_path, &final_path)?;
            scratch.keep(&final_path);
        }
        Selection::Audio(audio) => {
            let audio_path = fetch_audio(job, resolver, observer, scratch, &audio)?;
            observer.on_stage(&JobStage::Convert);
            scratch.track(final_path.clone());
            transcoder.convert_audio(&audio_path, &final_path)?;
            scratch.keep(&final_path);
        }
    }

    Ok(final_path)
}

fn fetch_video(
    job: &DownloadJob,
    resolver: &dyn Resolver,
    observer: &mut dyn JobObserver,
    scratch: &mut Scratch,
    stream: &StreamDescriptor,
) -> JobResult<PathBuf> {
    let path = video_temp_path(&job.output_dir);
    observer.on_stage(&JobStage::DownloadVideo {
        label: stream.label(),
    });
    fetch_into(resolver, scratch, stream, path)
}

fn fetch_audio(
    job: &DownloadJob,
    resolver: &dyn Resolver,
    observer: &mut dyn JobObserver,
    scratch: &mut Scratch,
    stream: &StreamDescriptor,
) -> JobResult<PathBuf> {
    let path = audio_temp_path(&job.output_dir, &stream.container);
    observer.on_stage(&JobStage::DownloadAudio {
        label: stream.label(),
    });
    fetch_into(resolver, scratch, stream, path)
}

/// Registers `path` as scratch before anything is written to it, then downloads.
fn fetch_into(
    resolver: &dyn Resolver,
    scratch: &mut Scratch,
    stream: &StreamDescriptor,
    path: PathBuf,
) -> JobResult<PathBuf> {
    let path = scratch.track(path);
    let bytes = resolver.download(stream, &path)?;
    tracing::info!(id = %stream.id, bytes, path = %path.display(), "stream downloaded");
    Ok(path)
}

/// Scratch files of one job, mirrored into the job's [`ScratchRegistry`].
struct Scratch {
    files: Vec<TempFile>,
    registry: ScratchRegistry,
}

impl Scratch {
    fn new(registry: ScratchRegistry) -> Self {
        Self {
            files: Vec::new(),
            registry,
        }
    }

    fn track(&mut self, path: PathBuf) -> PathBuf {
        self.registry.register(&path);
        let tracked = path.clone();
        self.files.push(TempFile::new(path));
        tracked
    }

    /// Stop tracking `path`; it survives cleanup.
    fn keep(&mut self, path: &Path) {
        if let Some(i) = self.files.iter().position(|f| f.path() == path) {
            self.registry.release(path);
            self.files.swap_remove(i).keep();
        }
    }

    fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn cleanup(self) -> Vec<String> {
        let Scratch { files, registry } = self;
        files
            .into_iter()
            .filter_map(|f| {
                registry.release(f.path());
                f.cleanup().err()
            })
            .map(|w| w.to_string())
            .collect()
    }
}

/// Final output path for `title`, never one of the fixed scratch names.
fn output_path_for(dir: &Path, title: &str, ext: &str) -> PathBuf {
    let stem = naming::sanitize_title(title);
    if stem == VIDEO_TEMP_STEM || stem == AUDIO_TEMP_STEM {
        naming::final_output_path(dir, &format!("{stem}_output"), ext)
    } else {
        naming::final_output_path(dir, title, ext)
    }
}

/// Scratch path for a video track (or progressive download) in `dir`.
pub fn video_temp_path(dir: &Path) -> PathBuf {
    dir.join(format!("{VIDEO_TEMP_STEM}.mp4"))
}

/// Scratch path for an audio track in `container` in `dir`.
pub fn audio_temp_path(dir: &Path, container: &Container) -> PathBuf {
    dir.join(format!("{AUDIO_TEMP_STEM}.{}", container.ext()))
}
