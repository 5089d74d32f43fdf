//! Allow-list deciding which tarball entries are written to the cache.
//!
//! Paths are relative to the tarball's top-level directory, which has
//! already been stripped. Header files are always kept; non-legacy versions
//! also keep the gyp build configuration.

use std::path::Path;

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};

use crate::core::error::DevResult;

/// Matched against the entry's base name.
pub const HEADER_PATTERNS: &[&str] = &["*.h"];
pub const GYP_BASENAME_PATTERNS: &[&str] = &["*.gypi"];
/// Matched against the full relative path.
pub const GYP_PATH_PATTERNS: &[&str] = &["tools/gyp_addon", "tools/gyp/**"];
pub const GYP_PATH_EXCLUDES: &[&str] = &["tools/gyp/test/**"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    Other,
}

#[derive(Debug, Clone)]
pub struct ExtractionFilter {
    is_legacy: bool,
    headers: GlobSet,
    gyp_basenames: GlobSet,
    gyp_paths: GlobSet,
    gyp_excludes: GlobSet,
}

impl ExtractionFilter {
    pub fn new(is_legacy: bool) -> DevResult<Self> {
        Ok(Self {
            is_legacy,
            headers: build_set(HEADER_PATTERNS)?,
            gyp_basenames: build_set(GYP_BASENAME_PATTERNS)?,
            gyp_paths: build_set(GYP_PATH_PATTERNS)?,
            gyp_excludes: build_set(GYP_PATH_EXCLUDES)?,
        })
    }

    /// An empty path is the archive's root directory and is always kept.
    pub fn accepts(&self, rel_path: &Path, kind: EntryKind) -> bool {
        if rel_path.as_os_str().is_empty() {
            return kind == EntryKind::Directory;
        }
        self.matches(rel_path)
    }

    fn matches(&self, rel_path: &Path) -> bool {
        // Every dot-named component would have to come from a wildcard, and
        // wildcards never match a leading `.`.
        if rel_path.components().any(|c| c.as_os_str().to_string_lossy().starts_with('.')) {
            return false;
        }
        let base_name = rel_path.file_name().map(Path::new);
        let base_matches = |set: &GlobSet| base_name.is_some_and(|name| set.is_match(name));

        if base_matches(&self.headers) {
            return true;
        }
        if self.is_legacy {
            return false;
        }
        base_matches(&self.gyp_basenames)
            || (self.gyp_paths.is_match(rel_path) && !self.gyp_excludes.is_match(rel_path))
    }
}

fn build_set(patterns: &[&str]) -> DevResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(literal_glob(pattern)?);
    }
    Ok(builder.build()?)
}

fn literal_glob(pattern: &str) -> DevResult<Glob> {
    Ok(GlobBuilder::new(pattern).literal_separator(true).build()?)
}
