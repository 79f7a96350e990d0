//! One interactive run: URL, format and output directory prompts, then a single job.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tubefetch_core::config::Mp4Mode;
use tubefetch_core::error::JobError;
use tubefetch_core::job::{
    run_job, DownloadJob, JobContext, JobObserver, JobStage, ScratchRegistry,
};
use tubefetch_core::prompt::Prompter;
use tubefetch_core::resolver::Resolver;
use tubefetch_core::selector::{OutputFormat, SelectionCriteria};
use tubefetch_core::transcoder::Transcoder;

const URL_PROMPT: &str = "Enter YouTube URL: ";
const FORMAT_PROMPT: &str = "Choose format (mp4/mp3): ";
const DIR_PROMPT: &str = "Enter output directory (press Enter for default ~/Downloads/YouTube): ";
const INVALID_DIR_LINE: &str =
    "Error: Invalid output directory. Using default ~/Downloads/YouTube.";
const INVALID_FORMAT_LINE: &str = "Error: Invalid format. Please choose 'mp4' or 'mp3'.";
/// Printed when the user cancels, at a prompt (end of input) or with Ctrl-C.
pub const CANCELLED_LINE: &str = "\nOperation cancelled by user.";

pub struct Session<'a> {
    pub resolver: &'a dyn Resolver,
    pub transcoder: &'a dyn Transcoder,
    pub default_output_dir: PathBuf,
    pub mp4_mode: Mp4Mode,
    /// Handed to the job; the Ctrl-C handler holds a clone.
    pub scratch: ScratchRegistry,
}

#[derive(Debug)]
pub enum SessionOutcome {
    Completed(PathBuf),
    /// Format answer was neither mp4 nor mp3; no job ran.
    InvalidFormat,
    Failed(JobError),
    Cancelled,
}

impl SessionOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            SessionOutcome::Completed(_) | SessionOutcome::Cancelled => 0,
            SessionOutcome::InvalidFormat | SessionOutcome::Failed(_) => 1,
        }
    }
}

impl Session<'_> {
    /// Runs the prompts and the job. Progress lines go to `progress`; everything
    /// else, including the final status line, goes through `prompter`.
    pub fn run<R: BufRead, W: Write, P: Write>(
        &self,
        prompter: &mut Prompter<R, W>,
        progress: P,
    ) -> SessionOutcome {
        let outcome = self.run_inner(prompter, progress);
        let line = match &outcome {
            SessionOutcome::Completed(_) | SessionOutcome::InvalidFormat => None,
            SessionOutcome::Failed(e) => Some(format!("Error: {e}")),
            SessionOutcome::Cancelled => Some(CANCELLED_LINE.to_string()),
        };
        if let Some(line) = line {
            if let Err(e) = prompter.say(&line) {
                tracing::warn!(error = %e, "could not print outcome");
            }
        }
        outcome
    }

    fn run_inner<R: BufRead, W: Write, P: Write>(
        &self,
        prompter: &mut Prompter<R, W>,
        progress: P,
    ) -> SessionOutcome {
        let answers = match ask_all(prompter) {
            Ok(a) => a,
            Err(e) => return failure(e),
        };

        let output_dir = match self.output_dir(&answers.dir) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(dir = %answers.dir, error = %e, "custom output directory rejected");
                if let Err(e) = prompter.say(INVALID_DIR_LINE) {
                    return failure(e);
                }
                self.default_output_dir.clone()
            }
        };

        let format = match answers.format.parse::<OutputFormat>() {
            Ok(f) => f,
            Err(reason) => {
                tracing::debug!(%reason, "format rejected");
                return match prompter.say(INVALID_FORMAT_LINE) {
                    Ok(()) => SessionOutcome::InvalidFormat,
                    Err(e) => failure(e),
                };
            }
        };
        let criteria = match format {
            OutputFormat::Mp4 => SelectionCriteria::mp4(self.mp4_mode),
            OutputFormat::Mp3 => SelectionCriteria::mp3(),
        };

        let job = DownloadJob {
            url: answers.url,
            criteria,
            output_dir,
            scratch: self.scratch.clone(),
        };
        let mut observer = ConsoleObserver { out: progress };
        let result = run_job(
            &job,
            JobContext {
                resolver: self.resolver,
                transcoder: self.transcoder,
                chooser: &mut *prompter,
                observer: &mut observer,
            },
        );

        match result {
            Ok(path) => {
                if let Err(e) = prompter.say(&completion_message(&criteria, &path)) {
                    tracing::warn!(error = %e, "could not print completion");
                }
                SessionOutcome::Completed(path)
            }
            Err(e) => failure(e),
        }
    }

    /// Empty answer → configured default. A custom directory must be creatable.
    fn output_dir(&self, answer: &str) -> std::io::Result<PathBuf> {
        if answer.is_empty() {
            return Ok(self.default_output_dir.clone());
        }
        let dir = PathBuf::from(answer);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

struct Answers {
    url: String,
    format: String,
    dir: String,
}

fn ask_all<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>) -> Result<Answers, JobError> {
    Ok(Answers {
        url: prompter.ask(URL_PROMPT)?,
        format: prompter.ask(FORMAT_PROMPT)?,
        dir: prompter.ask(DIR_PROMPT)?,
    })
}

fn failure(e: JobError) -> SessionOutcome {
    match e {
        JobError::Cancelled => SessionOutcome::Cancelled,
        other => SessionOutcome::Failed(other),
    }
}

fn completion_message(criteria: &SelectionCriteria, path: &Path) -> String {
    match (criteria.format, criteria.mp4_mode) {
        (OutputFormat::Mp3, _) => format!("Downloaded MP3: {}", path.display()),
        (OutputFormat::Mp4, Mp4Mode::Adaptive) => {
            format!("Download and merge complete: {}", path.display())
        }
        (OutputFormat::Mp4, Mp4Mode::Progressive) => {
            format!("Download complete: {}", path.display())
        }
    }
}

/// Prints progress lines and cleanup warnings.
struct ConsoleObserver<P> {
    out: P,
}

impl<P: Write> JobObserver for ConsoleObserver<P> {
    fn on_stage(&mut self, stage: &JobStage) {
        if matches!(stage, JobStage::Select | JobStage::Cleanup) {
            return;
        }
        let _ = writeln!(self.out, "{stage}");
    }

    fn on_warning(&mut self, message: &str) {
        let _ = writeln!(self.out, "Warning: {message}");
    }
}
