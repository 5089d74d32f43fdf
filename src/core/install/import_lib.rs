use futures_util::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, warn};

use crate::core::downloader::Downloader;
use crate::core::error::DevResult;
use crate::core::paths::{ensure_dir, InstallDirectory};

/// One architecture flavour of `node.lib`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportLibrary {
    /// Subdirectory of the install directory, e.g. `ia32`.
    pub arch: &'static str,
    /// Path below `v<version>/` on the mirror.
    pub remote_path: &'static str,
}

pub static IMPORT_LIBRARIES: [ImportLibrary; 2] = [
    ImportLibrary {
        arch: "ia32",
        remote_path: "node.lib",
    },
    ImportLibrary {
        arch: "x64",
        remote_path: "x64/node.lib",
    },
];

pub fn import_library_url(dist_url: &str, version: &str, lib: &ImportLibrary) -> String {
    format!("{dist_url}/v{version}/{}", lib.remote_path)
}

/// Fetches every `node.lib` variant concurrently. All variants are allowed
/// to settle; the first failure observed is the one returned.
pub async fn fetch_import_libraries(
    downloader: &Downloader,
    dist_url: &str,
    version: &str,
    dir: &InstallDirectory,
) -> DevResult<()> {
    debug!("on Windows; need to download `node.lib`...");

    let mut pending: FuturesUnordered<_> = IMPORT_LIBRARIES
        .iter()
        .map(|lib| fetch_one(downloader, dist_url, version, dir, lib))
        .collect();

    let mut first_error = None;
    while let Some(result) = pending.next().await {
        if let Err(err) = result {
            if first_error.is_none() {
                first_error = Some(err);
            } else {
                warn!("additional node.lib failure: {}", err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn fetch_one(
    downloader: &Downloader,
    dist_url: &str,
    version: &str,
    dir: &InstallDirectory,
    lib: &ImportLibrary,
) -> DevResult<()> {
    let lib_dir = dir.import_library_dir(lib.arch);
    let lib_path = dir.import_library_path(lib.arch);
    let url = import_library_url(dist_url, version, lib);
    debug!("{} node.lib dir {:?}, url {}", lib.arch, lib_dir, url);

    ensure_dir(&lib_dir).await?;
    debug!("streaming {} node.lib to: {:?}", lib.arch, lib_path);
    downloader.download_file(&url, &lib_path).await?;
    Ok(())
}
