//! Line-oriented interactive prompts over any reader/writer pair.

use crate::catalog::Resolution;
use crate::error::{JobError, JobResult};
use crate::selector::{join_resolutions, ResolutionChooser};
use std::io::{self, BufRead, Write};

/// Invalid answers tolerated before the resolution prompt gives up.
pub const MAX_RESOLUTION_ATTEMPTS: u32 = 5;

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` and read one trimmed line. End of input is [`JobError::Cancelled`].
    pub fn ask(&mut self, question: &str) -> JobResult<String> {
        write!(self.output, "{question}")
            .and_then(|_| self.output.flush())
            .map_err(console_error)?;

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => Err(JobError::Cancelled),
            Ok(_) => Ok(line.trim().to_string()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(JobError::Cancelled),
            Err(e) => Err(console_error(e)),
        }
    }

    /// Print a full line (no answer expected).
    pub fn say(&mut self, message: &str) -> JobResult<()> {
        writeln!(self.output, "{message}").map_err(console_error)
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl<R: BufRead, W: Write> ResolutionChooser for Prompter<R, W> {
    fn choose(&mut self, available: &[Resolution]) -> JobResult<Resolution> {
        let listed = join_resolutions(available);
        self.say(&format!("Available resolutions: {listed}"))?;

        let mut last = String::new();
        for _ in 0..MAX_RESOLUTION_ATTEMPTS {
            let answer = self.ask("Choose a resolution (e.g., 720p): ")?;
            if let Ok(r) = answer.parse::<Resolution>() {
                if available.contains(&r) {
                    return Ok(r);
                }
            }
            self.say(&format!("Invalid resolution. Please choose from: {listed}"))?;
            last = answer;
        }
        Err(JobError::ResolutionUnavailable {
            requested: last,
            available: listed,
        })
    }
}

fn console_error(e: io::Error) -> JobError {
    JobError::Console(e)
}
