//! Shared types passed between pipeline stages and handed to callers.

use image::ImageFormat;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A reference to an image on disk, with the facts the pipeline needs.
///
/// Assets are immutable; stages that write a new image produce a new asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    path: PathBuf,
    width: u32,
    height: u32,
    /// Encoding inferred from the file extension (`None` when unrecognised).
    format: Option<ImageFormat>,
}

impl ImageAsset {
    pub fn new(path: &Path, width: u32, height: u32) -> Self {
        Self {
            path: path.to_path_buf(),
            width,
            height,
            format: ImageFormat::from_path(path).ok(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// The same image after it has been moved to `path`.
    pub fn relocated(&self, path: &Path) -> Self {
        Self::new(path, self.width, self.height)
    }
}

/// One user action: which image, and what to do with it.
#[derive(Debug, Clone)]
pub struct ProcessingRequest {
    pub source: ImageAsset,
    /// Produce a GIF of the painting process instead of only the final image.
    pub animate: bool,
    /// Fit the input within the configured maximum dimension first.
    pub resize: bool,
    /// Move the final artifact here instead of leaving it in the output store.
    pub output_path: Option<PathBuf>,
}

impl ProcessingRequest {
    /// A request with the defaults of the interactive front-end:
    /// static output, resizing on.
    pub fn new(source: ImageAsset) -> Self {
        Self {
            source,
            animate: false,
            resize: true,
            output_path: None,
        }
    }
}

/// Discriminator callers use to decide how to present a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Static,
    Animated,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultKind::Static => f.write_str("static image"),
            ResultKind::Animated => f.write_str("animation"),
        }
    }
}

/// The final artifact of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingResult {
    Static(ImageAsset),
    Animated(ImageAsset),
}

impl ProcessingResult {
    pub fn kind(&self) -> ResultKind {
        match self {
            ProcessingResult::Static(_) => ResultKind::Static,
            ProcessingResult::Animated(_) => ResultKind::Animated,
        }
    }

    pub fn asset(&self) -> &ImageAsset {
        match self {
            ProcessingResult::Static(asset) | ProcessingResult::Animated(asset) => asset,
        }
    }

    /// Same kind, different asset.
    pub fn map_asset(self, f: impl FnOnce(ImageAsset) -> ImageAsset) -> Self {
        match self {
            ProcessingResult::Static(asset) => ProcessingResult::Static(f(asset)),
            ProcessingResult::Animated(asset) => ProcessingResult::Animated(f(asset)),
        }
    }
}
