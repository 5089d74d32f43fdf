// ─── Install Configuration ───
// Explicit settings injected into the installer: cache root, distribution
// mirror, target platform and timeouts. Nothing here is read implicitly by
// the pipeline itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{DevError, DevResult};

/// Layout/content revision of a cached install. Bump to force every
/// `--ensure` run to reinstall.
pub const INSTALL_FORMAT_VERSION: u32 = 9;

pub const DEFAULT_DIST_URL: &str = "https://nodejs.org/dist";
const DEV_DIR_NAME: &str = ".node-gyp";
const SETTINGS_FILE: &str = "nodedev.json";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPlatform {
    Windows,
    Unix,
}

impl TargetPlatform {
    pub fn host() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    /// Windows toolchains link against a `node.lib` that is not part of the
    /// source tarball.
    pub fn needs_import_library(self) -> bool {
        matches!(self, Self::Windows)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "win32" | "windows" => Some(Self::Windows),
            "unix" | "linux" | "darwin" | "macos" => Some(Self::Unix),
            _ => None,
        }
    }
}

/// Where the replacement gyp files for 0.6/0.7 installs come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacySource {
    /// Compiled into the binary.
    Bundled,
    Directory(PathBuf),
}

#[derive(Debug, Clone)]
pub struct InstallConfig {
    pub dev_dir: PathBuf,
    pub dist_url: String,
    pub platform: TargetPlatform,
    pub install_format_version: u32,
    pub target: Option<String>,
    pub legacy_files: LegacySource,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
}

impl InstallConfig {
    pub fn new(dev_dir: impl Into<PathBuf>) -> Self {
        Self {
            dev_dir: dev_dir.into(),
            dist_url: DEFAULT_DIST_URL.to_string(),
            platform: TargetPlatform::host(),
            install_format_version: INSTALL_FORMAT_VERSION,
            target: None,
            legacy_files: LegacySource::Bundled,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }

    pub fn with_dist_url(mut self, dist_url: impl Into<String>) -> Self {
        self.dist_url = dist_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_platform(mut self, platform: TargetPlatform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }

    /// Copy legacy gyp files from `legacy_dir` instead of the bundled set.
    pub fn with_legacy_dir(mut self, legacy_dir: impl Into<PathBuf>) -> Self {
        self.legacy_files = LegacySource::Directory(legacy_dir.into());
        self
    }

    pub fn with_install_format_version(mut self, version: u32) -> Self {
        self.install_format_version = version;
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Builds the effective config. Explicit overrides win, then values
    /// persisted in `<dev_dir>/nodedev.json`, then built-in defaults.
    pub fn load(overrides: ConfigOverrides) -> DevResult<Self> {
        let dev_dir = match overrides.dev_dir {
            Some(dir) => dir,
            None => default_dev_dir(),
        };
        let settings = load_settings_from_disk(&dev_dir)?.unwrap_or_default();
        debug!("settings loaded from {:?}: {:?}", dev_dir, settings);

        let mut config = Self::new(dev_dir);
        if let Some(dist_url) = overrides.dist_url.or(settings.dist_url) {
            config = config.with_dist_url(dist_url);
        }
        config.target = overrides.target.or(settings.target);
        if let Some(platform) = overrides.platform {
            config.platform = platform;
        }
        if let Some(secs) = settings.idle_timeout_secs {
            config.idle_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub dev_dir: Option<PathBuf>,
    pub dist_url: Option<String>,
    pub target: Option<String>,
    pub platform: Option<TargetPlatform>,
}

/// User-editable defaults stored next to the cached installs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevSettings {
    #[serde(default)]
    pub dist_url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
}

fn load_settings_from_disk(dev_dir: &Path) -> DevResult<Option<DevSettings>> {
    let path = dev_dir.join(SETTINGS_FILE);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(DevError::io(path, source)),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

pub fn default_dev_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEV_DIR_NAME)
}
