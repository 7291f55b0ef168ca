//! Frame assembly: turn the painting steps into a looping GIF.
//!
//! Inference writes one frame per painting step into the layout's frame
//! directory. [`assemble`] encodes them, in file-name order, into the store's
//! animation file. When there are no frames (inference skipped them, or the
//! directory was never created) the request degrades to the static result
//! instead of failing.

use crate::imaging::{AnimationParams, BackendError, FrameDelay, ImageBackend, identify};
use crate::inference::OutputLayout;
use crate::types::ProcessingResult;
use log::{info, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Inference wrote no result at {0}")]
    MissingResult(PathBuf),
}

/// The static result inference wrote for `layout`.
pub fn static_result(
    backend: &impl ImageBackend,
    layout: &OutputLayout,
) -> Result<ProcessingResult, AssembleError> {
    let path = layout.result_path();
    if !path.is_file() {
        return Err(AssembleError::MissingResult(path));
    }
    Ok(ProcessingResult::Static(identify(backend, &path)?))
}

/// Build the animation for `layout`, or fall back to its static result.
///
/// The animation is written to `animation_path`, replacing any previous one.
pub fn assemble(
    backend: &impl ImageBackend,
    layout: &OutputLayout,
    animation_path: &Path,
    delay: FrameDelay,
) -> Result<ProcessingResult, AssembleError> {
    let frames = layout.frames()?;
    if frames.is_empty() {
        warn!(
            "No frames in {}; returning the static result instead of an animation",
            layout.frames_dir().display()
        );
        return static_result(backend, layout);
    }

    let count = frames.len();
    backend.animate(&AnimationParams {
        frames,
        output: animation_path.to_path_buf(),
        delay,
    })?;
    info!(
        "Assembled {count} frames into {} ({} ms/frame)",
        animation_path.display(),
        delay.millis()
    );

    Ok(ProcessingResult::Animated(identify(backend, animation_path)?))
}
