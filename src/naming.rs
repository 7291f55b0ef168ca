//! Filename conventions shared by the store, the assembler, and the CLI.
//!
//! ## Result names
//!
//! The CLI writes its final artifact next to the input with a fixed suffix:
//! - `portrait.jpg` → `portrait_painttransformed.jpg` (static)
//! - `portrait.jpg` → `portrait_painttransformed.gif` (animation)
//!
//! ## Frame order
//!
//! Frames are ordered by plain byte-wise comparison of their file names.
//! The inference stage numbers its frames with zero padding (`0000.jpg`,
//! `0001.jpg`, …), which makes that order chronological. Unpadded numbering
//! (`2.jpg` sorts after `10.jpg`) is a bug on the producing side, and is not
//! corrected here.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Suffix appended to the input's stem for CLI output files.
pub const RESULT_SUFFIX: &str = "_painttransformed";

/// Default output path for a CLI run on `input`.
pub fn default_output_path(input: &Path, animate: bool) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = if animate {
        Some("gif".to_string())
    } else {
        input.extension().map(|e| e.to_string_lossy().to_string())
    };
    let name = match ext {
        Some(ext) => format!("{stem}{RESULT_SUFFIX}.{ext}"),
        None => format!("{stem}{RESULT_SUFFIX}"),
    };
    input.with_file_name(name)
}

/// Reconcile a requested output path with the artifact actually produced.
///
/// The artifact's extension wins: an animation request that fell back to a
/// static PNG must not be written as `*.gif`.
pub fn align_extension(requested: &Path, artifact: &Path) -> PathBuf {
    match artifact.extension() {
        Some(ext) if requested.extension() != Some(ext) => requested.with_extension(ext),
        _ => requested.to_path_buf(),
    }
}

/// Whether `path` has exactly the extension `ext` (no leading dot).
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension() == Some(OsStr::new(ext))
}

/// Sort frame paths by file name, byte-wise.
pub fn sort_frames(frames: &mut [PathBuf]) {
    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_static_keeps_extension() {
        assert_eq!(
            default_output_path(Path::new("photos/cat.jpg"), false),
            PathBuf::from("photos/cat_painttransformed.jpg")
        );
    }

    #[test]
    fn default_output_animation_is_gif() {
        assert_eq!(
            default_output_path(Path::new("photos/cat.jpg"), true),
            PathBuf::from("photos/cat_painttransformed.gif")
        );
    }

    #[test]
    fn default_output_without_extension() {
        assert_eq!(
            default_output_path(Path::new("cat"), false),
            PathBuf::from("cat_painttransformed")
        );
    }

    #[test]
    fn align_extension_artifact_wins() {
        assert_eq!(
            align_extension(Path::new("out/cat.gif"), Path::new("store/tmp1.png")),
            PathBuf::from("out/cat.png")
        );
    }

    #[test]
    fn align_extension_matching_is_unchanged() {
        assert_eq!(
            align_extension(Path::new("out/cat.gif"), Path::new("store/animation.gif")),
            PathBuf::from("out/cat.gif")
        );
    }

    #[test]
    fn align_extension_artifact_without_extension() {
        assert_eq!(
            align_extension(Path::new("out/cat.gif"), Path::new("store/result")),
            PathBuf::from("out/cat.gif")
        );
    }

    #[test]
    fn has_extension_is_exact() {
        assert!(has_extension(Path::new("f/0001.jpg"), "jpg"));
        assert!(!has_extension(Path::new("f/0001.jpeg"), "jpg"));
        assert!(!has_extension(Path::new("f/0001.JPG"), "jpg"));
        assert!(!has_extension(Path::new("f/notes"), "jpg"));
    }

    #[test]
    fn sort_frames_zero_padded_is_chronological() {
        let mut frames: Vec<PathBuf> = ["0010.jpg", "0002.jpg", "0000.jpg", "0001.jpg"]
            .iter()
            .map(|n| PathBuf::from("frames").join(n))
            .collect();
        sort_frames(&mut frames);
        let names: Vec<_> = frames
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["0000.jpg", "0001.jpg", "0002.jpg", "0010.jpg"]);
    }

    #[test]
    fn sort_frames_is_lexicographic_not_numeric() {
        let mut frames = vec![PathBuf::from("2.jpg"), PathBuf::from("10.jpg")];
        sort_frames(&mut frames);
        assert_eq!(frames, [PathBuf::from("10.jpg"), PathBuf::from("2.jpg")]);
    }
}
