//! Glob pattern utilities
//!
//! This module provides the glob matching used by file selection and by the
//! command line when expanding changed-file arguments

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Check if a string contains glob pattern characters
pub fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?') || pattern.contains('[')
}

/// Create a GlobSet from a list of patterns for efficient batch matching
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("Invalid glob pattern '{pattern}'"))?;
        builder.add(glob);
    }

    Ok(builder.build()?)
}

/// Create a GlobSet for folder names; a trailing `/` is ignored
pub fn build_folder_globset(patterns: &[String]) -> Result<GlobSet> {
    let trimmed: Vec<String> = patterns
        .iter()
        .map(|p| p.trim_end_matches('/').to_string())
        .filter(|p| !p.is_empty())
        .collect();
    build_globset(&trimmed)
}

/// Expand changed-file arguments relative to `base_dir`.
///
/// Glob patterns expand to the files they currently match. Literal paths are
/// kept whether or not they exist, since a missing file is a removal.
pub fn expand_file_patterns<P: AsRef<Path>>(patterns: &[String], base_dir: P) -> Result<Vec<PathBuf>> {
    let base_dir = base_dir.as_ref();
    let mut paths = Vec::new();

    for pattern in patterns {
        if is_glob_pattern(pattern) {
            paths.extend(expand_glob_pattern(pattern, base_dir)?);
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    paths.sort();
    paths.dedup();
    Ok(paths)
}

/// Expand a single glob pattern to matching file paths relative to `base_dir`
pub fn expand_glob_pattern<P: AsRef<Path>>(pattern: &str, base_dir: P) -> Result<Vec<PathBuf>> {
    let base_dir = base_dir.as_ref();
    let matcher = Glob::new(pattern)
        .with_context(|| format!("Invalid glob pattern '{pattern}'"))?
        .compile_matcher();

    let mut matching_paths = Vec::new();
    for entry in WalkDir::new(base_dir).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(base_dir)
            && matcher.is_match(relative)
        {
            matching_paths.push(relative.to_path_buf());
        }
    }

    Ok(matching_paths)
}
