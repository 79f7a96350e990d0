//! Tests for the interactive session flow.

use crate::cli::session::{Session, SessionOutcome};
use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tubefetch_core::catalog::{Container, Resolution, StreamCatalog, StreamDescriptor, StreamKind};
use tubefetch_core::config::Mp4Mode;
use tubefetch_core::error::{JobError, JobResult};
use tubefetch_core::job::ScratchRegistry;
use tubefetch_core::prompt::Prompter;
use tubefetch_core::resolver::Resolver;
use tubefetch_core::transcoder::Transcoder;

fn descriptor(
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
        url: format!("https://media.invalid/{id}"),
        headers: HashMap::new(),
    }
}

/// Writes the stream id as the file body instead of going to the network.
struct StubResolver {
    resolves: Cell<u32>,
}

impl Resolver for StubResolver {
    fn resolve(&self, _url: &str) -> JobResult<StreamCatalog> {
        self.resolves.set(self.resolves.get() + 1);
        Ok(StreamCatalog::new(
            "Clip",
            vec![
                descriptor("18", "mp4", StreamKind::Progressive, Some(360), None),
                descriptor("137", "mp4", StreamKind::VideoOnly, Some(1080), None),
                descriptor("136", "mp4", StreamKind::VideoOnly, Some(720), None),
                descriptor("140", "m4a", StreamKind::AudioOnly, None, Some(128.0)),
            ],
        ))
    }

    fn download(&self, stream: &StreamDescriptor, dest: &Path) -> JobResult<u64> {
        fs::write(dest, stream.id.as_bytes())
            .map_err(|e| JobError::filesystem("failed to write", dest, e))?;
        Ok(stream.id.len() as u64)
    }
}

/// Concatenates its inputs into the output.
struct CopyTranscoder;

impl Transcoder for CopyTranscoder {
    fn check_available(&self) -> JobResult<()> {
        Ok(())
    }

    fn merge(&self, video: &Path, audio: &Path, output: &Path) -> JobResult<()> {
        let mut data = fs::read(video).unwrap();
        data.extend(fs::read(audio).unwrap());
        fs::write(output, data).unwrap();
        Ok(())
    }

    fn convert_audio(&self, input: &Path, output: &Path) -> JobResult<()> {
        fs::copy(input, output).unwrap();
        Ok(())
    }
}

struct Run {
    outcome: SessionOutcome,
    printed: String,
    progress: String,
    resolves: u32,
}

fn run(input: &str, default_dir: &Path, mode: Mp4Mode) -> Run {
    let resolver = StubResolver {
        resolves: Cell::new(0),
    };
    let session = Session {
        resolver: &resolver,
        transcoder: &CopyTranscoder,
        default_output_dir: default_dir.to_path_buf(),
        mp4_mode: mode,
        scratch: ScratchRegistry::new(),
    };
    let mut prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
    let mut progress = Vec::new();
    let outcome = session.run(&mut prompter, &mut progress);
    let (_, out) = prompter.into_inner();
    Run {
        outcome,
        printed: String::from_utf8(out).unwrap(),
        progress: String::from_utf8(progress).unwrap(),
        resolves: resolver.resolves.get(),
    }
}

#[test]
fn adaptive_mp4_into_default_dir() {
    let dir = tempfile::tempdir().unwrap();
    let r = run("https://youtu.be/abc\nmp4\n\n720p\n", dir.path(), Mp4Mode::Adaptive);

    let expected = dir.path().join("Clip.mp4");
    match &r.outcome {
        SessionOutcome::Completed(path) => assert_eq!(path, &expected),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(r.outcome.exit_code(), 0);
    assert_eq!(fs::read(&expected).unwrap(), b"136140");
    let prompts = concat!(
        "Enter YouTube URL: ",
        "Choose format (mp4/mp3): ",
        "Enter output directory (press Enter for default ~/Downloads/YouTube): ",
    );
    assert!(r.printed.starts_with(prompts));
    assert!(r.printed.contains("Available resolutions: 1080p, 720p\n"));
    assert!(r
        .printed
        .contains(&format!("Download and merge complete: {}", expected.display())));
    assert!(r.progress.contains("Downloading video: 720p\n"));
    assert!(r.progress.contains("Downloading audio: 128kbps\n"));
}

#[test]
fn mp3_into_custom_dir() {
    let root = tempfile::tempdir().unwrap();
    let custom = root.path().join("music");
    let input = format!("https://youtu.be/abc\nMP3\n{}\n", custom.display());
    let r = run(&input, &root.path().join("default"), Mp4Mode::Adaptive);

    let expected = custom.join("Clip.mp3");
    assert!(matches!(&r.outcome, SessionOutcome::Completed(p) if p == &expected));
    assert!(r.printed.contains(&format!("Downloaded MP3: {}", expected.display())));
    assert!(!root.path().join("default").exists());
}

#[test]
fn progressive_mode_skips_resolution_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let r = run("https://youtu.be/abc\nmp4\n\n", dir.path(), Mp4Mode::Progressive);

    assert!(matches!(r.outcome, SessionOutcome::Completed(_)));
    assert!(!r.printed.contains("Available resolutions"));
    assert_eq!(fs::read(dir.path().join("Clip.mp4")).unwrap(), b"18");
}

#[test]
fn invalid_format_runs_no_job() {
    let dir = tempfile::tempdir().unwrap();
    let r = run("https://youtu.be/abc\nwav\n\n", dir.path(), Mp4Mode::Adaptive);

    assert!(matches!(r.outcome, SessionOutcome::InvalidFormat));
    assert_eq!(r.outcome.exit_code(), 1);
    assert_eq!(r.resolves, 0);
    assert!(r
        .printed
        .ends_with("Error: Invalid format. Please choose 'mp4' or 'mp3'.\n"));
}

#[test]
fn uncreatable_custom_dir_falls_back_to_default() {
    let root = tempfile::tempdir().unwrap();
    let blocker = root.path().join("file");
    fs::write(&blocker, b"not a dir").unwrap();
    let default_dir = root.path().join("default");
    let input = format!("https://youtu.be/abc\nmp3\n{}\n", blocker.join("sub").display());
    let r = run(&input, &default_dir, Mp4Mode::Adaptive);

    assert!(r
        .printed
        .contains("Error: Invalid output directory. Using default ~/Downloads/YouTube.\n"));
    let expected = default_dir.join("Clip.mp3");
    assert!(matches!(&r.outcome, SessionOutcome::Completed(p) if p == &expected));
}

#[test]
fn end_of_input_cancels() {
    let dir = tempfile::tempdir().unwrap();
    let r = run("https://youtu.be/abc\n", dir.path(), Mp4Mode::Adaptive);

    assert!(matches!(r.outcome, SessionOutcome::Cancelled));
    assert_eq!(r.outcome.exit_code(), 0);
    assert!(r.printed.ends_with("\nOperation cancelled by user.\n"));
    assert_eq!(r.resolves, 0);
}

#[test]
fn cancel_at_resolution_prompt_cleans_nothing_up() {
    let dir = tempfile::tempdir().unwrap();
    let r = run("https://youtu.be/abc\nmp4\n\n", dir.path(), Mp4Mode::Adaptive);

    assert!(matches!(r.outcome, SessionOutcome::Cancelled));
    assert_eq!(r.resolves, 1);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn job_error_is_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let r = run("https://youtu.be/abc\nmp4\n\n1\n2\n3\n4\n5\n", dir.path(), Mp4Mode::Adaptive);

    assert!(matches!(
        r.outcome,
        SessionOutcome::Failed(JobError::ResolutionUnavailable { .. })
    ));
    assert_eq!(r.outcome.exit_code(), 1);
    let last = r.printed.lines().last().unwrap();
    assert!(last.starts_with("Error: resolution 5 is not available"), "{last}");
}
