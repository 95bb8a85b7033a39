//! Application context: capability trait objects plus the path settings the
//! boundary layer needs. Constructed once at process start and passed to all
//! consumers.

use crate::platform::{HttpDownloader, NullAudio, NullDisplay, StdFilesystem};
use crate::traits::*;
use serde::Deserialize;
use std::path::PathBuf;

/// Filesystem locations and mounts, loadable from the application's config
/// file. Defaults match the appliance image layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Mount point whose capacity gates bulky operations.
    pub data_mount: String,
    /// Directory for per-operation helper logs.
    pub log_dir: PathBuf,
    /// Scratch directory for cached remote assets.
    pub cache_dir: PathBuf,
    /// Zero-byte sentinel signalling "finished initializing".
    pub ready_flag: PathBuf,
    /// Release version file, first line is the version string.
    pub version_file: PathBuf,
    pub backlight_value: PathBuf,
    pub backlight_max: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_mount: "/data".to_string(),
            log_dir: PathBuf::from("/data/system/logs"),
            cache_dir: PathBuf::from("/data/system/cache"),
            ready_flag: PathBuf::from("/tmp/bosun.ready"),
            version_file: PathBuf::from("/usr/share/bosun/version"),
            backlight_value: PathBuf::from("/sys/class/backlight/backlight/brightness"),
            backlight_max: PathBuf::from("/sys/class/backlight/backlight/max_brightness"),
        }
    }
}

/// Central context passed to all boundary-layer operations.
///
/// Holds trait-object capabilities so callers (GUI / CLI / tests) can swap
/// implementations — a real mixer versus a no-op one, a fake downloader in
/// tests.
pub struct AppContext {
    fs: Box<dyn FilesystemOps>,
    downloader: Box<dyn Downloader>,
    audio: Box<dyn AudioControl>,
    display: Box<dyn DisplayControl>,
    settings: Settings,
}

impl AppContext {
    pub fn new(
        fs: Box<dyn FilesystemOps>,
        downloader: Box<dyn Downloader>,
        audio: Box<dyn AudioControl>,
        display: Box<dyn DisplayControl>,
        settings: Settings,
    ) -> Self {
        Self {
            fs,
            downloader,
            audio,
            display,
            settings,
        }
    }

    /// Context with real platform implementations. Audio and display are
    /// no-ops until the embedding application supplies its own.
    pub fn default_platform(settings: Settings) -> Self {
        Self::new(
            Box::new(StdFilesystem),
            Box::new(HttpDownloader::new()),
            Box::new(NullAudio),
            Box::new(NullDisplay),
            settings,
        )
    }

    pub fn fs(&self) -> &dyn FilesystemOps {
        self.fs.as_ref()
    }

    pub fn downloader(&self) -> &dyn Downloader {
        self.downloader.as_ref()
    }

    pub fn audio(&self) -> &dyn AudioControl {
        self.audio.as_ref()
    }

    pub fn display(&self) -> &dyn DisplayControl {
        self.display.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}
