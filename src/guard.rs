//! Scoped lifetime for temporary artifacts.
//!
//! A [`ResourceGuard`] owns every scratch file and directory created while a
//! request runs: resized inputs, and the frame directories the inference
//! stage writes for animations. [`ResourceGuard::cleanup`] deletes them all;
//! the guard also runs it on drop, so an early `?` return or a panic cannot
//! leave anything behind.
//!
//! Each artifact is removed at most once: cleanup drains the list. Artifacts
//! that are already gone count as removed. A deletion that fails is logged at
//! `warn` and otherwise ignored; it never turns a successful request into a
//! failed one.

use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Prefix for temp files, so strays are easy to spot in `/tmp`.
const TEMP_PREFIX: &str = "painterly-";

enum TempArtifact {
    File(TempPath),
    Dir(PathBuf),
}

impl TempArtifact {
    fn path(&self) -> &Path {
        match self {
            TempArtifact::File(path) => path.as_ref(),
            TempArtifact::Dir(path) => path.as_path(),
        }
    }

    fn remove(self) -> io::Result<()> {
        let result = match self {
            TempArtifact::File(path) => path.close(),
            TempArtifact::Dir(path) => std::fs::remove_dir_all(path),
        };
        match result {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// Tracks the temp artifacts of one request and deletes them.
#[derive(Default)]
pub struct ResourceGuard {
    dir: Option<PathBuf>,
    artifacts: Vec<TempArtifact>,
}

impl ResourceGuard {
    /// A guard that creates temp files in the system temp directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// A guard that creates temp files in `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            dir: Some(dir.to_path_buf()),
            artifacts: Vec::new(),
        }
    }

    /// Create an empty, uniquely named temp file ending in `suffix` and take
    /// ownership of it. Returns its path for the caller to write into.
    pub fn create_file(&mut self, suffix: &str) -> io::Result<PathBuf> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(suffix);
        let file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        let path = file.into_temp_path();
        let owned = path.to_path_buf();
        debug!("Created temp artifact {}", owned.display());
        self.artifacts.push(TempArtifact::File(path));
        Ok(owned)
    }

    /// Take ownership of a directory that someone else will create (or has
    /// created). It is removed recursively on cleanup.
    pub fn track_dir(&mut self, dir: &Path) {
        self.artifacts.push(TempArtifact::Dir(dir.to_path_buf()));
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Delete every tracked artifact. Returns how many were removed (or were
    /// already gone). Calling it again is a no-op.
    pub fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for artifact in self.artifacts.drain(..) {
            let path = artifact.path().to_path_buf();
            match artifact.remove() {
                Ok(()) => removed += 1,
                Err(e) => warn!("Could not remove temp artifact {}: {}", path.display(), e),
            }
        }
        removed
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        self.cleanup();
    }
}
