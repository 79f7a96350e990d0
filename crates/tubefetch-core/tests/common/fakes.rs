//! In-process stand-ins for yt-dlp and ffmpeg.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use tubefetch_core::catalog::{Container, Resolution, StreamCatalog, StreamDescriptor, StreamKind};
use tubefetch_core::error::{JobError, JobResult};
use tubefetch_core::fetch;
use tubefetch_core::job::{JobObserver, JobStage};
use tubefetch_core::resolver::Resolver;
use tubefetch_core::transcoder::Transcoder;

pub fn stream(
    base: &str,
    id: &str,
    ext: &str,
    kind: StreamKind,
    height: Option<u32>,
    abr: Option<f64>,
) -> StreamDescriptor {
    StreamDescriptor {
        id: id.to_string(),
        container: Container::from_ext(ext),
        kind,
        resolution: height.map(Resolution),
        abr,
        url: format!("{base}/{id}"),
        headers: HashMap::new(),
    }
}

/// Returns a fixed catalog; downloads go over HTTP to whatever the stream URLs point at.
pub struct CatalogResolver {
    pub catalog: JobResult<StreamCatalog>,
    pub resolve_calls: Cell<u32>,
    pub downloads: RefCell<Vec<(String, PathBuf)>>,
}

impl CatalogResolver {
    pub fn new(catalog: StreamCatalog) -> Self {
        Self {
            catalog: Ok(catalog),
            resolve_calls: Cell::new(0),
            downloads: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(err: JobError) -> Self {
        Self {
            catalog: Err(err),
            resolve_calls: Cell::new(0),
            downloads: RefCell::new(Vec::new()),
        }
    }
}

impl Resolver for CatalogResolver {
    fn resolve(&self, _url: &str) -> JobResult<StreamCatalog> {
        self.resolve_calls.set(self.resolve_calls.get() + 1);
        match &self.catalog {
            Ok(c) => Ok(c.clone()),
            Err(JobError::InvalidUrl(m)) => Err(JobError::InvalidUrl(m.clone())),
            Err(JobError::Network(m)) => Err(JobError::Network(m.clone())),
            Err(other) => Err(JobError::Network(other.to_string())),
        }
    }

    fn download(&self, stream: &StreamDescriptor, dest: &Path) -> JobResult<u64> {
        self.downloads
            .borrow_mut()
            .push((stream.id.clone(), dest.to_path_buf()));
        fetch::fetch_to_path(&stream.url, &stream.headers, dest)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranscodeCall {
    Merge {
        video: PathBuf,
        audio: PathBuf,
        output: PathBuf,
    },
    Convert {
        input: PathBuf,
        output: PathBuf,
    },
}

/// Fake ffmpeg: concatenates inputs into the output, or writes half an output and fails.
pub struct FakeTranscoder {
    pub available: bool,
    pub fail_with: Option<String>,
    /// Replace the input with a non-empty directory after reading it, so it cannot be deleted.
    pub pin_input: bool,
    pub calls: RefCell<Vec<TranscodeCall>>,
}

impl FakeTranscoder {
    pub fn working() -> Self {
        Self {
            available: true,
            fail_with: None,
            pin_input: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn missing() -> Self {
        Self {
            available: false,
            ..Self::working()
        }
    }

    pub fn failing(stderr: &str) -> Self {
        Self {
            fail_with: Some(stderr.to_string()),
            ..Self::working()
        }
    }

    fn produce(&self, inputs: &[&Path], output: &Path) -> JobResult<()> {
        let mut data = Vec::new();
        for input in inputs {
            data.extend(fs::read(input).expect("transcoder input exists"));
            if self.pin_input {
                fs::remove_file(input).unwrap();
                fs::create_dir(input).unwrap();
                fs::write(input.join("keep"), b"x").unwrap();
            }
        }
        match &self.fail_with {
            None => {
                fs::write(output, data).unwrap();
                Ok(())
            }
            Some(stderr) => {
                fs::write(output, &data[..data.len() / 2]).unwrap();
                Err(JobError::TranscoderFailed {
                    status: failed_status(),
                    stderr: stderr.clone(),
                })
            }
        }
    }
}

impl Transcoder for FakeTranscoder {
    fn check_available(&self) -> JobResult<()> {
        if self.available {
            Ok(())
        } else {
            Err(JobError::TranscoderUnavailable {
                binary: "ffmpeg".to_string(),
                reason: "not found".to_string(),
            })
        }
    }

    fn merge(&self, video: &Path, audio: &Path, output: &Path) -> JobResult<()> {
        self.calls.borrow_mut().push(TranscodeCall::Merge {
            video: video.to_path_buf(),
            audio: audio.to_path_buf(),
            output: output.to_path_buf(),
        });
        self.produce(&[video, audio], output)
    }

    fn convert_audio(&self, input: &Path, output: &Path) -> JobResult<()> {
        self.calls.borrow_mut().push(TranscodeCall::Convert {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
        });
        self.produce(&[input], output)
    }
}

pub fn failed_status() -> ExitStatus {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(1 << 8)
    }
    #[cfg(windows)]
    {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(1)
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub stages: Vec<JobStage>,
    pub warnings: Vec<String>,
}

impl JobObserver for RecordingObserver {
    fn on_stage(&mut self, stage: &JobStage) {
        self.stages.push(stage.clone());
    }

    fn on_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}
