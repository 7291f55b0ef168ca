//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode (JPEG, PNG, GIF, WebP) | `image::ImageReader` with content sniffing |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → PNG / JPEG | `DynamicImage::save_with_format` |
//! | Encode → GIF animation | `image::codecs::gif::GifEncoder`, `Repeat::Infinite` |
//! | Frame decoding | `rayon` parallel iterator (order preserved) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{AnimationParams, ResizeParams};
use image::codecs::gif::{GifEncoder, Repeat};
use image::imageops::FilterType;
use image::{Delay, DynamicImage, Frame, ImageFormat, ImageReader, RgbaImage};
use rayon::prelude::*;
use std::io::BufWriter;
use std::path::Path;

/// GIF quantizer speed (1 = best quality, 30 = fastest). Painting frames are
/// mostly flat strokes, so a mid setting loses nothing visible.
const GIF_SPEED: i32 = 10;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
///
/// The format is sniffed from content first, so a PNG saved with a `.jpg`
/// name still decodes.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Save a DynamicImage to the given path, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path) -> Result<(), BackendError> {
    let format = ImageFormat::from_path(path).map_err(|_| {
        BackendError::ProcessingFailed(format!(
            "Unsupported output format: {}",
            path.display()
        ))
    })?;

    // JPEG has no alpha channel; the encoder rejects RGBA input
    let encoded = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img.clone(),
    };

    encoded
        .save_with_format(path, format)
        .map_err(|e| BackendError::ProcessingFailed(format!("Encode failed: {}", e)))
}

/// Encode RGBA frames as a GIF that repeats forever.
///
/// Encodes into a temp file next to `path` and renames it into place, so a
/// failed encode leaves nothing at `path`.
fn save_gif(frames: Vec<RgbaImage>, path: &Path, delay_ms: u32) -> Result<(), BackendError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let staged = tempfile::Builder::new()
        .prefix(".painterly-")
        .suffix(".gif")
        .tempfile_in(dir)
        .map_err(BackendError::Io)?;

    {
        let mut encoder = GifEncoder::new_with_speed(BufWriter::new(staged.as_file()), GIF_SPEED);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| BackendError::ProcessingFailed(format!("GIF header failed: {}", e)))?;

        let delay = Delay::from_numer_denom_ms(delay_ms, 1);
        encoder
            .encode_frames(
                frames
                    .into_iter()
                    .map(|buffer| Frame::from_parts(buffer, 0, 0, delay)),
            )
            .map_err(|e| BackendError::ProcessingFailed(format!("GIF encode failed: {}", e)))?;
        // Dropping the encoder writes the trailer and flushes the buffer
    }

    staged
        .persist(path)
        .map_err(|e| BackendError::Io(e.error))?;
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        save_image(&resized, &params.output)
    }

    fn animate(&self, params: &AnimationParams) -> Result<(), BackendError> {
        if params.frames.is_empty() {
            return Err(BackendError::ProcessingFailed(
                "An animation needs at least one frame".into(),
            ));
        }

        // collect() on an indexed parallel iterator keeps input order
        let frames = params
            .frames
            .par_iter()
            .map(|path| load_image(path).map(|img| img.into_rgba8()))
            .collect::<Result<Vec<_>, _>>()?;

        save_gif(frames, &params.output, params.delay.millis())
    }
}
