use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the dev-files installer.
/// Every module returns `Result<T, DevError>`.
#[derive(Debug, Error)]
pub enum DevError {
    // ── Version ─────────────────────────────────────────
    #[error("Invalid version number: {0}")]
    InvalidVersion(String),

    #[error("Minimum target version is `0.6.0` or greater. Got: {0}")]
    UnsupportedVersion(String),

    #[error("Could not determine the running node version: {0}")]
    RuntimeProbe(String),

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status} status code downloading {url}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Download of {url} stalled for more than {idle_secs}s")]
    DownloadStalled { url: String, idle_secs: u64 },

    #[error("Invalid proxy url {url}: {source}")]
    InvalidProxy {
        url: String,
        source: reqwest::Error,
    },

    // ── Archive ─────────────────────────────────────────
    #[error("There was a fatal problem while downloading/extracting the tarball")]
    ExtractionFailed,

    #[error("Corrupt tarball stream: {0}")]
    Archive(std::io::Error),

    #[error("Refusing to extract entry outside the install directory: {0}")]
    UnsafeEntryPath(String),

    #[error("Invalid extraction pattern: {0}")]
    Glob(#[from] globset::Error),

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Settings file error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Generic ─────────────────────────────────────────
    #[error("Background task failed: {0}")]
    Task(String),
}

/// Convenience alias used throughout the crate.
pub type DevResult<T> = Result<T, DevError>;

/// Coarse classification callers match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidVersion,
    UnsupportedVersion,
    Download,
    ExtractionFailed,
    Filesystem,
    Other,
}

impl DevError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DevError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DevError::InvalidVersion(_) => ErrorKind::InvalidVersion,
            DevError::UnsupportedVersion(_) => ErrorKind::UnsupportedVersion,
            DevError::Http(_)
            | DevError::DownloadFailed { .. }
            | DevError::DownloadStalled { .. }
            | DevError::InvalidProxy { .. } => ErrorKind::Download,
            DevError::ExtractionFailed
            | DevError::Archive(_)
            | DevError::UnsafeEntryPath(_) => ErrorKind::ExtractionFailed,
            DevError::Io { .. } => ErrorKind::Filesystem,
            DevError::RuntimeProbe(_)
            | DevError::Glob(_)
            | DevError::Json(_)
            | DevError::Task(_) => ErrorKind::Other,
        }
    }
}

impl From<tokio::task::JoinError> for DevError {
    fn from(source: tokio::task::JoinError) -> Self {
        DevError::Task(source.to_string())
    }
}
