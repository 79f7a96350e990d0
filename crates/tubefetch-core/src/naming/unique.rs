//! Collision avoidance for output paths.

use std::path::{Path, PathBuf};

/// Returns `path` if nothing exists there, else the first free `<stem>_<n><.ext>`
/// with n = 1, 2, ...
pub fn ensure_unique_filename(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1u32;
    loop {
        let candidate = path.with_file_name(format!("{stem}_{counter}{ext}"));
        if !candidate.exists() {
            tracing::debug!(
                original = %path.display(),
                chosen = %candidate.display(),
                "output name taken, using suffix"
            );
            return candidate;
        }
        counter += 1;
    }
}
