//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! and the [`backend`](super::backend), which does the pixel work.
//!
//! - [`FrameDelay`]: per-frame display time of an animation, in milliseconds.
//! - [`ResizeParams`]: source, output path and exact target dimensions.
//! - [`AnimationParams`]: ordered frame paths, output path and frame delay.

use std::path::PathBuf;

/// Per-frame display duration of an animation.
///
/// GIF stores delays in hundredths of a second as a `u16`, so the value is
/// clamped to 10 ms ..= 655 350 ms on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDelay(u32);

impl FrameDelay {
    pub const MIN_MS: u32 = 10;
    pub const MAX_MS: u32 = u16::MAX as u32 * 10;

    pub fn from_millis(ms: u32) -> Self {
        Self(ms.clamp(Self::MIN_MS, Self::MAX_MS))
    }

    pub fn millis(self) -> u32 {
        self.0
    }
}

impl Default for FrameDelay {
    fn default() -> Self {
        Self(100)
    }
}

/// Parameters for a resize operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Parameters for encoding a frame sequence into an animation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationParams {
    /// Frames in display order.
    pub frames: Vec<PathBuf>,
    pub output: PathBuf,
    pub delay: FrameDelay,
}
