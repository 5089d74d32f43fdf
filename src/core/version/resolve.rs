// ─── Version Resolution ───
// Turns a requested version string into the canonical major.minor.patch
// triple that keys the cache directory and every download URL.

use std::fmt;

use semver::Version;
use tracing::debug;

use crate::core::error::{DevError, DevResult};

use super::probe::VersionProbe;

const MINIMUM_VERSION: Version = Version::new(0, 6, 0);
const LEGACY_CUTOFF: Version = Version::new(0, 8, 0);
const UNPUBLISHED_PRE_TAG: &str = "pre";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResolvedVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// 0.6.x and 0.7.x ship broken gyp files and need the bundled ones.
    pub is_legacy: bool,
}

impl fmt::Display for ResolvedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Picks the version string to install: explicit argument, then the
/// configured target, then whatever `node` is on the PATH.
pub fn select_version_string(
    explicit: Option<&str>,
    configured_target: Option<&str>,
    probe: &dyn VersionProbe,
) -> DevResult<String> {
    let chosen = explicit
        .filter(|v| !v.trim().is_empty())
        .or(configured_target.filter(|v| !v.trim().is_empty()));
    match chosen {
        Some(version) => Ok(version.to_string()),
        None => probe.runtime_version(),
    }
}

pub fn resolve_version(input: &str) -> DevResult<ResolvedVersion> {
    debug!("input version string {:?}", input);
    let cleaned = input.trim().trim_start_matches('=').trim_start_matches('v');
    let version =
        Version::parse(cleaned).map_err(|_| DevError::InvalidVersion(input.to_string()))?;

    let is_legacy = version < LEGACY_CUTOFF;
    debug!("installing legacy version? {}", is_legacy);

    if version < MINIMUM_VERSION {
        return Err(DevError::UnsupportedVersion(input.to_string()));
    }

    let mut patch = version.patch;
    if version.pre.as_str() == UNPUBLISHED_PRE_TAG {
        // x.y.z-pre is not on the mirror yet; fall back to the last release.
        patch = patch
            .checked_sub(1)
            .ok_or_else(|| DevError::InvalidVersion(input.to_string()))?;
        debug!("-pre version detected, adjusting patch version to {}", patch);
    }

    let resolved = ResolvedVersion {
        major: version.major,
        minor: version.minor,
        patch,
        is_legacy,
    };
    debug!("installing version {}", resolved);
    Ok(resolved)
}
