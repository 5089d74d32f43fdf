pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::config::{
    ConfigOverrides, InstallConfig, LegacySource, TargetPlatform, INSTALL_FORMAT_VERSION,
};
pub use crate::core::error::{DevError, DevResult, ErrorKind};
pub use crate::core::install::{
    list_installed, remove, InstallOutcome, InstallRequest, InstallStatus, InstalledVersion,
    Installer, RemoveOutcome,
};
pub use crate::core::version::{resolve_version, ResolvedVersion, VersionProbe};

/// Initialize structured logging. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "info,nodedev=debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
