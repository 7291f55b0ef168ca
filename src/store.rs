//! The output store: the directory inference writes into.
//!
//! The store has fixed, well-known names in it (the animation file, one
//! result per input name), so two requests running against the same store
//! would overwrite each other's outputs, and a `clear` in the middle of a
//! request would delete files it still needs. Access is therefore serialized:
//! every operation goes through a [`StoreSession`], which holds the store's
//! lock for as long as it lives.
//!
//! ```text
//! let store = OutputStore::open("inference/output", "animation.gif")?;
//! let session = store.lock();
//! let result = orchestrator.process(&session, &request)?;
//! // ...read the result back while still holding `session`...
//! ```

use crate::inference::OutputLayout;
use log::{debug, info, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// File extensions `clear` treats as store output.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// What a `clear` removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearSummary {
    pub files: usize,
    pub dirs: usize,
}

impl ClearSummary {
    pub fn is_empty(&self) -> bool {
        self.files == 0 && self.dirs == 0
    }
}

/// A staging directory for inference outputs.
#[derive(Debug)]
pub struct OutputStore {
    root: PathBuf,
    animation_name: String,
    lock: Mutex<()>,
}

impl OutputStore {
    /// Open the store at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>, animation_name: &str) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            animation_name: animation_name.to_string(),
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wait for exclusive access to the store.
    pub fn lock(&self) -> StoreSession<'_> {
        // The lock guards no data, so a panic in another holder leaves
        // nothing inconsistent behind.
        let guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        StoreSession {
            store: self,
            _guard: guard,
        }
    }
}

/// Exclusive access to an [`OutputStore`].
pub struct StoreSession<'a> {
    store: &'a OutputStore,
    _guard: MutexGuard<'a, ()>,
}

impl StoreSession<'_> {
    pub fn root(&self) -> &Path {
        &self.store.root
    }

    /// Where the assembled animation is written.
    pub fn animation_path(&self) -> PathBuf {
        self.store.root.join(&self.store.animation_name)
    }

    /// The output layout inference will produce for `input`.
    pub fn layout_for(&self, input: &Path, frame_extension: &str) -> Option<OutputLayout> {
        OutputLayout::new(&self.store.root, input, frame_extension)
    }

    /// Delete every image file and every subdirectory directly under the root.
    ///
    /// Files with other extensions are left alone, as is everything outside
    /// the root. Clearing an empty (or missing) store does nothing.
    pub fn clear(&self) -> io::Result<ClearSummary> {
        let mut summary = ClearSummary::default();
        let entries = match std::fs::read_dir(self.root()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(summary),
            Err(e) => return Err(e),
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            // file_type() does not follow symlinks: a link to a directory is
            // removed as a file, never recursed into.
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                remove_missing_ok(std::fs::remove_dir_all(&path))?;
                summary.dirs += 1;
            } else if is_image_file(&path) {
                remove_missing_ok(std::fs::remove_file(&path))?;
                summary.files += 1;
            }
        }

        info!(
            "Cleared {}: {} files, {} directories",
            self.root().display(),
            summary.files,
            summary.dirs
        );
        Ok(summary)
    }

    /// Remove whatever inference left behind for one input.
    ///
    /// Used after a failed request so no partial output stays in the store.
    /// Failures are logged, not returned: the caller is already on an error
    /// path.
    pub fn discard(&self, layout: &OutputLayout) {
        let result = layout.result_path();
        if let Err(e) = remove_missing_ok(std::fs::remove_file(&result)) {
            warn!("Could not remove partial result {}: {}", result.display(), e);
        }
        let frames = layout.frames_dir();
        if let Err(e) = remove_missing_ok(std::fs::remove_dir_all(&frames)) {
            warn!("Could not remove partial frames {}: {}", frames.display(), e);
        }
        debug!("Discarded store output for {}", result.display());
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
}

fn remove_missing_ok(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store_in(tmp: &TempDir) -> OutputStore {
        OutputStore::open(tmp.path().join("output"), "animation.gif").unwrap()
    }

    #[test]
    fn open_creates_root() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        assert!(store.root().is_dir());
    }

    #[test]
    fn animation_path_is_fixed() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        assert_eq!(
            store.lock().animation_path(),
            store.root().join("animation.gif")
        );
    }

    #[test]
    fn clear_removes_images_and_frame_dirs_only() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let root = store.root();
        for name in ["a.png", "b.JPG", "c.jpeg", "animation.gif", "notes.txt"] {
            fs::write(root.join(name), b"x").unwrap();
        }
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a/0000.jpg"), b"x").unwrap();
        let outside = tmp.path().join("keep.png");
        fs::write(&outside, b"x").unwrap();

        let summary = store.lock().clear().unwrap();

        assert_eq!(summary, ClearSummary { files: 4, dirs: 1 });
        let left: Vec<_> = fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(left, ["notes.txt"]);
        assert!(outside.exists());
    }

    #[test]
    fn clear_twice_is_noop() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        fs::write(store.root().join("a.png"), b"x").unwrap();

        let session = store.lock();
        assert!(!session.clear().unwrap().is_empty());
        assert!(session.clear().unwrap().is_empty());
    }

    #[test]
    fn clear_missing_root_is_noop() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        fs::remove_dir(store.root()).unwrap();
        assert!(store.lock().clear().unwrap().is_empty());
    }

    #[test]
    fn discard_removes_one_invocation() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        let session = store.lock();
        let layout = session.layout_for(Path::new("/tmp/x.png"), "jpg").unwrap();
        let other = session.layout_for(Path::new("/tmp/y.png"), "jpg").unwrap();
        fs::write(layout.result_path(), b"x").unwrap();
        fs::create_dir_all(layout.frames_dir()).unwrap();
        fs::write(other.result_path(), b"y").unwrap();

        session.discard(&layout);
        assert!(!layout.result_path().exists());
        assert!(!layout.frames_dir().exists());
        assert!(other.result_path().exists());

        // Nothing left to remove: still fine
        session.discard(&layout);
    }

    #[test]
    fn sessions_are_exclusive() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let tmp = TempDir::new().unwrap();
        let store = Arc::new(store_in(&tmp));
        let inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let inside = Arc::clone(&inside);
                std::thread::spawn(move || {
                    let _session = store.lock();
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    std::thread::sleep(std::time::Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
