//! Module discovery for recursive checks
//!
//! Walks a directory tree with the `ignore` crate and reports every directory
//! that directly contains a `*.tf` or `*.tf.json` file. Hidden directories
//! (including `.terraform`) are skipped, `.gitignore` is respected, and
//! directories matching an exclude pattern are left out.

use crate::error::LoadError;
use crate::hcl::is_config_file;
use crate::types::GlobPattern;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Finds module directories below a root
#[derive(Debug)]
pub struct ModuleWalker {
    root: PathBuf,
    exclude_set: GlobSet,
}

impl ModuleWalker {
    /// Creates a walker for `root`
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidGlob` if an exclude pattern does not compile.
    pub fn new(root: &Path, exclude: &[GlobPattern]) -> Result<Self, LoadError> {
        Ok(Self {
            root: root.to_path_buf(),
            exclude_set: build_globset(exclude)?,
        })
    }

    /// Module directories in path order
    pub fn discover(&self) -> Result<Vec<PathBuf>, LoadError> {
        let walker = WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .build();

        let mut dirs = BTreeSet::new();
        for result in walker {
            let entry = result?;
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !is_config_file(name) {
                continue;
            }
            if self.is_excluded(path) {
                tracing::debug!(path = %path.display(), "excluded by pattern");
                continue;
            }
            if let Some(parent) = path.parent() {
                dirs.insert(parent.to_path_buf());
            }
        }

        tracing::debug!(root = %self.root.display(), modules = dirs.len(), "discovered modules");
        Ok(dirs.into_iter().collect())
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if self.exclude_set.is_match(path) {
            return true;
        }
        path.strip_prefix(&self.root)
            .is_ok_and(|relative| self.exclude_set.is_match(relative))
    }
}

fn build_globset(patterns: &[GlobPattern]) -> Result<GlobSet, LoadError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern.as_str()).map_err(|e| LoadError::InvalidGlob {
            pattern: pattern.as_str().to_string(),
            source: e,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| LoadError::InvalidGlob {
        pattern: "<globset>".to_string(),
        source: e,
    })
}
