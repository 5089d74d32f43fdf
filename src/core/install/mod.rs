// ─── Install Orchestration ───
// resolve version → (ensure gate) → fetch + extract → finalize (join)
// Any failure after the first write rolls the version directory back
// exactly once and reports the original error.

pub mod completion;
pub mod fetch;
pub mod filter;
pub mod finalize;
pub mod gate;
pub mod import_lib;
pub mod legacy;
pub mod rollback;

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::core::config::InstallConfig;
use crate::core::downloader::Downloader;
use crate::core::error::DevResult;
use crate::core::http::{build_http_client, resolve_proxy_from_env};
use crate::core::paths::InstallDirectory;
use crate::core::version::{
    resolve_version, select_version_string, NodeBinaryProbe, ResolvedVersion, VersionProbe,
};

use completion::CompletionGate;
use fetch::{fetch_and_extract, tarball_url};
use filter::ExtractionFilter;
use finalize::{plan_steps, run_finalizers, FinalizeContext};
use gate::{check_install, GateDecision};

pub use rollback::{list_installed, remove, InstalledVersion, RemoveOutcome};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallRequest {
    pub version: Option<String>,
    /// Skip the download when an adequate install is already cached.
    pub ensure: bool,
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    Installed,
    AlreadyInstalled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Canonical `major.minor.patch`.
    pub version: String,
    pub status: InstallStatus,
}

pub struct Installer {
    config: InstallConfig,
    probe: Box<dyn VersionProbe>,
    proxy_from_env: bool,
}

impl Installer {
    pub fn new(config: InstallConfig) -> Self {
        Self {
            config,
            probe: Box::new(NodeBinaryProbe::default()),
            proxy_from_env: true,
        }
    }

    pub fn with_probe(mut self, probe: impl VersionProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Ignore `http_proxy` and friends; only an explicit proxy is used.
    pub fn without_env_proxy(mut self) -> Self {
        self.proxy_from_env = false;
        self
    }

    #[instrument(skip(self))]
    pub async fn install(&self, request: &InstallRequest) -> DevResult<InstallOutcome> {
        let requested = select_version_string(
            request.version.as_deref(),
            self.config.target.as_deref(),
            self.probe.as_ref(),
        )?;
        let resolved = resolve_version(&requested)?;
        let version = resolved.to_string();
        let dir = InstallDirectory::new(&self.config.dev_dir, &version);

        if request.ensure {
            debug!("--ensure was passed, so won't reinstall if already installed");
            match check_install(&dir, self.config.install_format_version).await? {
                GateDecision::Satisfied { installed } => {
                    info!("version {} already installed (installVersion {})", version, installed);
                    return Ok(InstallOutcome {
                        version,
                        status: InstallStatus::AlreadyInstalled,
                    });
                }
                GateDecision::Outdated {
                    installed,
                    required,
                } => info!(
                    "reinstalling {}: installVersion {} is older than {}",
                    version, installed, required
                ),
                GateDecision::NotInstalled => debug!("{} not installed yet", version),
            }
        }

        let proxy = if self.proxy_from_env {
            resolve_proxy_from_env(request.proxy.as_deref())
        } else {
            request.proxy.clone()
        };
        let client = build_http_client(&self.config, proxy.as_deref())?;
        let downloader = Downloader::new(client, self.config.idle_timeout);
        let filter = ExtractionFilter::new(resolved.is_legacy)?;

        let attempt = InstallAttempt::new(dir);
        let result = self.fetch_and_finalize(&resolved, &attempt.dir, downloader, filter).await;
        attempt.finish(result).await?;

        info!("installed node development files for {}", version);
        Ok(InstallOutcome {
            version,
            status: InstallStatus::Installed,
        })
    }

    async fn fetch_and_finalize(
        &self,
        resolved: &ResolvedVersion,
        dir: &InstallDirectory,
        downloader: Downloader,
        filter: ExtractionFilter,
    ) -> DevResult<()> {
        let version = resolved.to_string();
        let url = tarball_url(&self.config.dist_url, &version);
        fetch_and_extract(&downloader, &url, dir, filter).await?;

        let steps = plan_steps(
            resolved.is_legacy,
            self.config.platform.needs_import_library(),
        );
        let ctx = Arc::new(FinalizeContext {
            downloader,
            dist_url: self.config.dist_url.clone(),
            version,
            dir: dir.clone(),
            legacy_files: self.config.legacy_files.clone(),
            install_format_version: self.config.install_format_version,
        });
        run_finalizers(ctx, steps).await
    }
}

/// Owns the install directory for one attempt and settles it exactly once.
struct InstallAttempt {
    dir: InstallDirectory,
    gate: CompletionGate,
}

impl InstallAttempt {
    fn new(dir: InstallDirectory) -> Self {
        Self {
            dir,
            gate: CompletionGate::new(),
        }
    }

    /// Passes `result` through. Only the first settled error rolls back;
    /// later ones leave the directory alone.
    async fn finish(&self, result: DevResult<()>) -> DevResult<()> {
        let first = self.gate.try_fire();
        if let Err(err) = &result {
            if first {
                rollback::rollback(&self.dir).await;
            } else {
                debug!("install already settled, not rolling back again: {}", err);
            }
        }
        result
    }
}
