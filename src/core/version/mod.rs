pub mod probe;
pub mod resolve;

pub use probe::{NodeBinaryProbe, VersionProbe};
pub use resolve::{resolve_version, select_version_string, ResolvedVersion};
