use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

use crate::errors::{CleanError, Result};

/// Compile glob patterns, rejecting malformed ones as a validation error.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| CleanError::Validation {
                field: "file-glob-patterns".to_string(),
                reason: format!("invalid pattern '{pattern}': {e}"),
            })
        })
        .collect()
}

/// Collect every file under `source` matching at least one of the glob
/// patterns, recursively.
///
/// Patterns are matched against the path relative to `source`, applied in the
/// order given. A file matched by several patterns appears exactly once. The
/// walk is sorted by file name so the result is repeatable across runs on an
/// unchanged tree.
pub fn collect_files(source: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let compiled = compile_patterns(patterns)?;

    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for pattern in &compiled {
        for entry in WalkDir::new(source)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(source).unwrap_or(path);
            if pattern.matches_path(relative) && seen.insert(path.to_path_buf()) {
                files.push(path.to_path_buf());
            }
        }
    }

    Ok(files)
}
