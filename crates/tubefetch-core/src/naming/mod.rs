//! Output filename derivation.
//!
//! Turns a video title into a safe, length-capped file name and avoids
//! clobbering files already present in the output directory.

mod sanitize;
mod unique;

pub use sanitize::{sanitize_title, MAX_TITLE_CHARS};
pub use unique::ensure_unique_filename;

use std::path::{Path, PathBuf};

/// Final output path for `title` in `dir` with extension `ext`, collision-free at call time.
///
/// # Examples
///
/// - `final_output_path("/out", "A/B: live?", "mp4")` → `/out/A_B_ live_.mp4`
/// - with `/out/A_B_ live_.mp4` already present → `/out/A_B_ live__1.mp4`
pub fn final_output_path(dir: &Path, title: &str, ext: &str) -> PathBuf {
    let name = format!("{}.{}", sanitize_title(title), ext);
    ensure_unique_filename(&dir.join(name))
}
