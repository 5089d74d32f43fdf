// ─── nodedev Core ───
// Local cache of node development files (headers + gyp configuration)
// keyed by runtime version.
//
// Architecture:
//   core/
//     version/   : Version selection, normalization, runtime probe
//     install/   : Ensure gate, fetch pipeline, finalizers, rollback
//     downloader/: Streaming HTTP downloads with idle timeout
//     config     : Explicit install configuration + settings file
//     http       : Client construction and proxy precedence
//     paths      : Cache layout and existence probing

pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod install;
pub mod paths;
pub mod version;
