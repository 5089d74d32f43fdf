use tracing::debug;

use crate::core::error::{DevError, DevResult};
use crate::core::paths::{probe_path, InstallDirectory, Presence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Cached install is at least as new as the required format.
    Satisfied { installed: u32 },
    NotInstalled,
    Outdated { installed: u32, required: u32 },
}

/// `--ensure` check: only reinstall when the directory is missing or its
/// install record predates `required`.
pub async fn check_install(dir: &InstallDirectory, required: u32) -> DevResult<GateDecision> {
    if probe_path(dir.root()).await? == Presence::Absent {
        debug!("version not already installed, continuing with install");
        return Ok(GateDecision::NotInstalled);
    }

    debug!("version is already installed, need to check \"installVersion\"");
    let installed = read_install_record(dir).await?;
    debug!("got \"installVersion\": {}, needs: {}", installed, required);

    if installed < required {
        debug!("version is no good; reinstalling");
        Ok(GateDecision::Outdated {
            installed,
            required,
        })
    } else {
        debug!("version is good");
        Ok(GateDecision::Satisfied { installed })
    }
}

/// Reads the install-format marker. A missing or unreadable number counts
/// as 0, the oldest possible format.
pub async fn read_install_record(dir: &InstallDirectory) -> DevResult<u32> {
    let path = dir.install_record_path();
    match tokio::fs::read_to_string(&path).await {
        Ok(raw) => Ok(parse_install_record(&raw)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(source) => Err(DevError::io(path, source)),
    }
}

fn parse_install_record(raw: &str) -> u32 {
    let digits: String = raw
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}
