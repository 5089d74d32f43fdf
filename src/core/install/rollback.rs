use std::path::Path;

use semver::Version;
use tracing::{debug, info, warn};

use crate::core::config::InstallConfig;
use crate::core::error::{DevError, DevResult};
use crate::core::paths::{probe_path, InstallDirectory, Presence};
use crate::core::version::resolve_version;

use super::gate::read_install_record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotInstalled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    pub version: String,
    pub install_format_version: u32,
}

/// Best effort: the caller is already reporting another error, so a
/// failure here is only logged.
pub async fn rollback(dir: &InstallDirectory) {
    debug!("got an error, rolling back install");
    if let Err(err) = remove_install_dir(dir).await {
        warn!("rollback of {:?} failed: {}", dir.root(), err);
    }
}

pub async fn remove_install_dir(dir: &InstallDirectory) -> DevResult<RemoveOutcome> {
    if probe_path(dir.root()).await? == Presence::Absent {
        return Ok(RemoveOutcome::NotInstalled);
    }
    match tokio::fs::remove_dir_all(dir.root()).await {
        Ok(()) => Ok(RemoveOutcome::Removed),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(RemoveOutcome::NotInstalled),
        Err(source) => Err(DevError::io(dir.root(), source)),
    }
}

/// `remove <version>`: deletes the cached dev files for one version.
pub async fn remove(config: &InstallConfig, version: &str) -> DevResult<RemoveOutcome> {
    let resolved = resolve_version(version)?;
    let dir = InstallDirectory::new(&config.dev_dir, &resolved.to_string());
    let outcome = remove_install_dir(&dir).await?;
    match outcome {
        RemoveOutcome::Removed => info!("removed node development files for {}", resolved),
        RemoveOutcome::NotInstalled => info!("version was already uninstalled: {}", resolved),
    }
    Ok(outcome)
}

/// Versions present under the dev dir, oldest first.
pub async fn list_installed(config: &InstallConfig) -> DevResult<Vec<InstalledVersion>> {
    let dev_dir: &Path = &config.dev_dir;
    if probe_path(dev_dir).await? == Presence::Absent {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    let mut entries = tokio::fs::read_dir(dev_dir)
        .await
        .map_err(|source| DevError::io(dev_dir, source))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|source| DevError::io(dev_dir, source))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|source| DevError::io(entry.path(), source))?;
        if !file_type.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let Ok(parsed) = Version::parse(&name) else {
            continue;
        };
        let dir = InstallDirectory::new(dev_dir, &name);
        let install_format_version = read_install_record(&dir).await?;
        found.push((parsed, InstalledVersion {
            version: name,
            install_format_version,
        }));
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found.into_iter().map(|(_, installed)| installed).collect())
}
