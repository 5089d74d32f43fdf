// ─── Finalization ───
// After a successful extraction: write the install record, copy the legacy
// gyp files (0.6/0.7 only) and fetch node.lib (Windows only), concurrently.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, instrument};

use crate::core::config::LegacySource;
use crate::core::downloader::Downloader;
use crate::core::error::{DevError, DevResult};
use crate::core::paths::InstallDirectory;

use super::completion::JoinCounter;
use super::import_lib::fetch_import_libraries;
use super::legacy::install_legacy_files;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeStep {
    LegacyCopy,
    InstallRecord,
    ImportLibraries,
}

/// Everything a finalization step needs, owned so steps can run as tasks.
#[derive(Debug, Clone)]
pub struct FinalizeContext {
    pub downloader: Downloader,
    pub dist_url: String,
    pub version: String,
    pub dir: InstallDirectory,
    pub legacy_files: LegacySource,
    pub install_format_version: u32,
}

impl FinalizeContext {
    async fn run(&self, step: FinalizeStep) -> DevResult<()> {
        match step {
            FinalizeStep::LegacyCopy => {
                install_legacy_files(&self.legacy_files, self.dir.root()).await
            }
            FinalizeStep::InstallRecord => {
                write_install_record(&self.dir, self.install_format_version).await
            }
            FinalizeStep::ImportLibraries => {
                fetch_import_libraries(&self.downloader, &self.dist_url, &self.version, &self.dir)
                    .await
            }
        }
    }
}

pub fn plan_steps(is_legacy: bool, needs_import_library: bool) -> Vec<FinalizeStep> {
    let mut steps = Vec::with_capacity(3);
    if is_legacy {
        steps.push(FinalizeStep::LegacyCopy);
    }
    if needs_import_library {
        steps.push(FinalizeStep::ImportLibraries);
    }
    steps.push(FinalizeStep::InstallRecord);
    steps
}

/// Runs `steps` concurrently and succeeds once all of them have. The first
/// failure aborts the rest; they are awaited before returning so nothing is
/// still writing into the install directory afterwards.
#[instrument(skip(ctx))]
pub async fn run_finalizers(ctx: Arc<FinalizeContext>, steps: Vec<FinalizeStep>) -> DevResult<()> {
    let mut counter = JoinCounter::new(steps.len());
    if counter.is_empty() {
        return Ok(());
    }

    let mut tasks = JoinSet::new();
    for step in steps {
        let ctx = Arc::clone(&ctx);
        tasks.spawn(async move { (step, ctx.run(step).await) });
    }

    while let Some(joined) = tasks.join_next().await {
        let failure = match joined {
            Ok((step, Ok(()))) => {
                let remaining = counter.settle();
                debug!("{:?} done, {} remaining", step, remaining);
                None
            }
            Ok((step, Err(err))) => {
                debug!("{:?} failed: {}", step, err);
                Some(err)
            }
            Err(join_err) => Some(DevError::from(join_err)),
        };

        if let Some(err) = failure {
            tasks.abort_all();
            while let Some(straggler) = tasks.join_next().await {
                if let Ok((step, Err(secondary))) = straggler {
                    debug!("ignoring {:?} failure during abort: {}", step, secondary);
                }
            }
            return Err(err);
        }
    }

    debug_assert!(counter.is_empty());
    Ok(())
}

pub async fn write_install_record(dir: &InstallDirectory, version: u32) -> DevResult<()> {
    let path = dir.install_record_path();
    tokio::fs::write(&path, format!("{version}\n"))
        .await
        .map_err(|source| DevError::io(path, source))
}
