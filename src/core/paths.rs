use std::path::{Path, PathBuf};

use crate::core::error::{DevError, DevResult};

const INSTALL_RECORD_FILE: &str = "installVersion";
const IMPORT_LIBRARY_FILE: &str = "node.lib";

/// Location of one cached install: `<dev_dir>/<major>.<minor>.<patch>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallDirectory {
    root: PathBuf,
}

impl InstallDirectory {
    pub fn new(dev_dir: &Path, version: &str) -> Self {
        Self {
            root: dev_dir.join(version),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn install_record_path(&self) -> PathBuf {
        self.root.join(INSTALL_RECORD_FILE)
    }

    pub fn import_library_dir(&self, arch: &str) -> PathBuf {
        self.root.join(arch)
    }

    pub fn import_library_path(&self, arch: &str) -> PathBuf {
        self.import_library_dir(arch).join(IMPORT_LIBRARY_FILE)
    }
}

/// Outcome of probing a path, separating "absent" from real failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Absent,
    Directory,
    File,
}

pub async fn probe_path(path: &Path) -> DevResult<Presence> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(Presence::Directory),
        Ok(_) => Ok(Presence::File),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Presence::Absent),
        Err(source) => Err(DevError::io(path, source)),
    }
}

/// Idempotent `mkdir -p`; returns `true` when the directory was created.
pub async fn ensure_dir(path: &Path) -> DevResult<bool> {
    let existed = probe_path(path).await? == Presence::Directory;
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| DevError::io(path, source))?;
    Ok(!existed)
}
