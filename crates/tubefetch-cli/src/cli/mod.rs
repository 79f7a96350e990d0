//! CLI for tubefetch.

mod interrupt;
mod session;

use anyhow::Result;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tubefetch_core::config::{self, Mp4Mode};
use tubefetch_core::job::ScratchRegistry;
use tubefetch_core::prompt::Prompter;
use tubefetch_core::resolver::YtDlpResolver;
use tubefetch_core::transcoder::Ffmpeg;

use session::{Session, SessionOutcome};

/// Interactive downloader: asks for a URL, a format and an output directory.
#[derive(Debug, Parser)]
#[command(name = "tubefetch")]
#[command(about = "Download a YouTube video as MP4 or its audio as MP3", long_about = None)]
pub struct Cli {
    /// Read configuration from PATH instead of ~/.config/tubefetch/config.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Download the best single progressive MP4 stream instead of merging separate tracks.
    #[arg(long)]
    pub progressive: bool,
}

impl Cli {
    /// Parse arguments, run one interactive session and return the process exit code.
    pub fn run_from_args() -> Result<i32> {
        Cli::parse().run()
    }

    fn run(self) -> Result<i32> {
        let cfg = match &self.config {
            Some(path) => config::load_or_init_at(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        let scratch = ScratchRegistry::new();
        interrupt::install(scratch.clone());

        let resolver = YtDlpResolver::new(cfg.ytdlp_path.clone());
        let transcoder = Ffmpeg::new(cfg.ffmpeg_path.clone());
        let session = Session {
            resolver: &resolver,
            transcoder: &transcoder,
            default_output_dir: cfg.output_dir()?,
            mp4_mode: self.mp4_mode(cfg.mp4_mode),
            scratch,
        };

        let stdin = io::stdin();
        let mut prompter = Prompter::new(stdin.lock(), io::stdout());
        let outcome = session.run(&mut prompter, io::stdout());
        match &outcome {
            SessionOutcome::Completed(path) => {
                tracing::info!(output = %path.display(), "session completed")
            }
            other => tracing::info!(?other, "session ended"),
        }
        Ok(outcome.exit_code())
    }

    fn mp4_mode(&self, configured: Mp4Mode) -> Mp4Mode {
        if self.progressive {
            Mp4Mode::Progressive
        } else {
            configured
        }
    }
}

#[cfg(test)]
mod tests;
