//! External transcoder (ffmpeg) invocation with fixed argument lists.

use crate::error::{JobError, JobResult};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

/// Audio codec used for both merge and convert.
pub const AUDIO_CODEC: &str = "mp3";
/// Audio bitrate used for both merge and convert.
pub const AUDIO_BITRATE: &str = "192k";

pub trait Transcoder {
    /// Fails with [`JobError::TranscoderUnavailable`] if the binary cannot be run.
    fn check_available(&self) -> JobResult<()>;

    /// Mux `video` (copied) with `audio` (re-encoded) into `output`.
    fn merge(&self, video: &Path, audio: &Path, output: &Path) -> JobResult<()>;

    /// Re-encode the single audio stream of `input` into `output`.
    fn convert_audio(&self, input: &Path, output: &Path) -> JobResult<()>;
}

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    binary: String,
}

impl Ffmpeg {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(&self, args: Vec<OsString>) -> JobResult<()> {
        tracing::debug!(binary = %self.binary, ?args, "running transcoder");
        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| JobError::TranscoderUnavailable {
                binary: self.binary.clone(),
                reason: e.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::warn!(status = %output.status, "transcoder failed");
            Err(JobError::TranscoderFailed {
                status: output.status,
                stderr,
            })
        }
    }
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Transcoder for Ffmpeg {
    fn check_available(&self) -> JobResult<()> {
        let status = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| JobError::TranscoderUnavailable {
                binary: self.binary.clone(),
                reason: e.to_string(),
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(JobError::TranscoderUnavailable {
                binary: self.binary.clone(),
                reason: format!("`-version` exited with {status}"),
            })
        }
    }

    fn merge(&self, video: &Path, audio: &Path, output: &Path) -> JobResult<()> {
        self.run(merge_args(video, audio, output))
    }

    fn convert_audio(&self, input: &Path, output: &Path) -> JobResult<()> {
        self.run(convert_args(input, output))
    }
}

/// `-y -i <video> -i <audio> -c:v copy -c:a mp3 -b:a 192k <output>`
pub fn merge_args(video: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-y".into(),
        "-i".into(),
        video.into(),
        "-i".into(),
        audio.into(),
    ];
    args.extend(["-c:v", "copy"].map(OsString::from));
    args.extend(audio_args());
    args.push(output.into());
    args
}

/// `-y -i <input> -c:a mp3 -b:a 192k <output>`
pub fn convert_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), input.into()];
    args.extend(audio_args());
    args.push(output.into());
    args
}

fn audio_args() -> [OsString; 4] {
    ["-c:a", AUDIO_CODEC, "-b:a", AUDIO_BITRATE].map(OsString::from)
}
