//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they decide
//! what needs to happen to an [`ImageAsset`], compute parameters, and call
//! the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::fit_within;
use super::params::ResizeParams;
use crate::guard::ResourceGuard;
use crate::types::ImageAsset;
use log::{debug, info};
use std::path::Path;
use thiserror::Error;

/// Default bounding dimension for [`normalize`].
pub const DEFAULT_MAX_DIM: u32 = 512;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
}

/// Open an image and record its dimensions and format.
pub fn identify(backend: &impl ImageBackend, path: &Path) -> Result<ImageAsset, BackendError> {
    let dims = backend.identify(path)?;
    Ok(ImageAsset::new(path, dims.width, dims.height))
}

/// Fit an image inside a `max_dim`×`max_dim` box, preserving aspect ratio.
///
/// When the image already fits, the original asset is returned as-is and
/// nothing is written. Otherwise a Lanczos3-resampled PNG is written to a new
/// temp artifact owned by `guard`, and the returned asset points at it.
pub fn normalize(
    backend: &impl ImageBackend,
    asset: &ImageAsset,
    max_dim: u32,
    guard: &mut ResourceGuard,
) -> Result<ImageAsset, NormalizeError> {
    if max_dim == 0 {
        return Err(NormalizeError::InvalidConfiguration(
            "max_dim must be greater than zero".into(),
        ));
    }

    let Some((width, height)) = fit_within(asset.dimensions(), max_dim) else {
        debug!(
            "{} is {}x{}, within {max_dim}px; not resizing",
            asset.path().display(),
            asset.width(),
            asset.height()
        );
        return Ok(asset.clone());
    };

    let output = guard.create_file(".png")?;
    backend.resize(&ResizeParams {
        source: asset.path().to_path_buf(),
        output: output.clone(),
        width,
        height,
    })?;
    info!(
        "Resized {} from {}x{} to {width}x{height}",
        asset.path().display(),
        asset.width(),
        asset.height()
    );

    Ok(ImageAsset::new(&output, width, height))
}
