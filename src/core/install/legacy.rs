//! Replacement gyp configuration for 0.6.x and 0.7.x installs, whose own
//! gyp files cannot build addons.

use std::path::Path;

use tracing::debug;

use crate::core::config::LegacySource;
use crate::core::error::{DevError, DevResult};

/// Relative path, contents, executable.
const BUNDLED_LEGACY_FILES: &[(&str, &[u8], bool)] = &[
    (
        "common.gypi",
        include_bytes!("../../../resources/legacy/common.gypi"),
        false,
    ),
    (
        "tools/gyp_addon",
        include_bytes!("../../../resources/legacy/tools/gyp_addon"),
        true,
    ),
];

pub async fn install_legacy_files(source: &LegacySource, dest: &Path) -> DevResult<()> {
    match source {
        LegacySource::Bundled => write_bundled_legacy_files(dest).await,
        LegacySource::Directory(dir) => copy_legacy_files(dir, dest).await,
    }
}

/// Writes the compiled-in legacy files into `dest`, overwriting.
pub async fn write_bundled_legacy_files(dest: &Path) -> DevResult<()> {
    debug!("writing bundled \"legacy\" gyp configuration files");
    for (rel_path, contents, executable) in BUNDLED_LEGACY_FILES {
        let path = dest.join(rel_path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| DevError::io(parent, source))?;
        }
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| DevError::io(&path, source))?;
        if *executable {
            mark_executable(&path).await?;
        }
    }
    Ok(())
}

#[cfg(unix)]
async fn mark_executable(path: &Path) -> DevResult<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|source| DevError::io(path, source))
}

#[cfg(not(unix))]
async fn mark_executable(_path: &Path) -> DevResult<()> {
    Ok(())
}

/// `cp -rpf legacy/* <dir>`: recursive, overwriting, keeping permissions.
pub async fn copy_legacy_files(legacy_dir: &Path, dest: &Path) -> DevResult<()> {
    debug!("copying \"legacy\" gyp configuration files from {:?}", legacy_dir);
    let mut pending = vec![(legacy_dir.to_path_buf(), dest.to_path_buf())];

    while let Some((src_dir, dst_dir)) = pending.pop() {
        tokio::fs::create_dir_all(&dst_dir)
            .await
            .map_err(|source| DevError::io(&dst_dir, source))?;

        let mut entries = tokio::fs::read_dir(&src_dir)
            .await
            .map_err(|source| DevError::io(&src_dir, source))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| DevError::io(&src_dir, source))?
        {
            let src_path = entry.path();
            let dst_path = dst_dir.join(entry.file_name());
            let file_type = entry
                .file_type()
                .await
                .map_err(|source| DevError::io(&src_path, source))?;

            if file_type.is_dir() {
                pending.push((src_path, dst_path));
            } else if file_type.is_file() {
                debug!("reading entry {:?}", src_path);
                // fs::copy carries the permission bits over.
                tokio::fs::copy(&src_path, &dst_path)
                    .await
                    .map_err(|source| DevError::io(&dst_path, source))?;
            }
        }
    }

    Ok(())
}
