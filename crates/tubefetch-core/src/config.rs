use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How an MP4 request is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mp4Mode {
    /// Separate video and audio tracks merged by ffmpeg; the user picks a resolution.
    #[default]
    Adaptive,
    /// Best single muxed stream; no ffmpeg involved.
    Progressive,
}

/// Global configuration loaded from `~/.config/tubefetch/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TubefetchConfig {
    /// Default output directory. When unset, `~/Downloads/YouTube`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// yt-dlp binary name or path.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: String,
    /// ffmpeg binary name or path.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,
    #[serde(default)]
    pub mp4_mode: Mp4Mode,
}

fn default_ytdlp_path() -> String {
    "yt-dlp".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

impl Default for TubefetchConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            ytdlp_path: default_ytdlp_path(),
            ffmpeg_path: default_ffmpeg_path(),
            mp4_mode: Mp4Mode::Adaptive,
        }
    }
}

impl TubefetchConfig {
    /// Configured output directory, or `~/Downloads/YouTube`.
    pub fn output_dir(&self) -> Result<PathBuf> {
        match &self.output_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_output_dir(),
        }
    }
}

/// `~/Downloads/YouTube`.
pub fn default_output_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join("Downloads").join("YouTube"))
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tubefetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from the default location, creating a default file if none exists.
pub fn load_or_init() -> Result<TubefetchConfig> {
    let path = config_path()?;
    load_or_init_at(&path)
}

/// Same as [`load_or_init`] for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<TubefetchConfig> {
    if !path.exists() {
        let default_cfg = TubefetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, toml).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let cfg: TubefetchConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}
