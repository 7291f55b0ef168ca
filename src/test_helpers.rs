//! Shared test utilities for the painterly test suite.
//!
//! Synthetic images, GIF inspection, and a stand-in for the inference
//! collaborator that writes the same on-disk layout the real one does.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! create_test_png(&tmp.path().join("in.png"), 1024, 768);
//!
//! let inference = FakeInference::painting(8);
//! // ...run an Orchestrator with `inference.clone()`...
//! assert_eq!(inference.inputs().len(), 1);
//! ```

use crate::inference::{Inference, InferenceError, InferenceJob, OutputLayout};
use image::{AnimationDecoder, ImageBuffer, Luma, Rgb, Rgba};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

// =========================================================================
// Synthetic images
// =========================================================================

/// Write a PNG with a gradient, so resizes have something to resample.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    });
    img.save(path).unwrap();
}

/// Write a JPEG filled with one grey level. Frames built this way are easy
/// to tell apart after a GIF round trip.
pub fn create_solid_jpeg(path: &Path, width: u32, height: u32, level: u8) {
    let img = ImageBuffer::from_pixel(width, height, Rgb([level, level, level]));
    img.save(path).unwrap();
}

/// Write an opaque RGB image. Saves in any format, JPEG included.
pub fn create_test_rgb(path: &Path, width: u32, height: u32) {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    img.save(path).unwrap();
}

/// Write a greyscale JPEG in one of the formats inference may produce.
fn create_frame(path: &Path, width: u32, height: u32, index: usize) {
    let level = ((index * 37) % 256) as u8;
    let img = ImageBuffer::from_pixel(width, height, Luma([level]));
    img.save(path).unwrap();
}

// =========================================================================
// Inspection
// =========================================================================

/// Decode every frame of a GIF file.
pub fn decode_gif_frames(path: &Path) -> Vec<image::Frame> {
    let reader = BufReader::new(File::open(path).unwrap());
    image::codecs::gif::GifDecoder::new(reader)
        .unwrap()
        .into_frames()
        .collect_frames()
        .unwrap()
}

/// Number of entries directly inside `dir` (0 if it does not exist).
pub fn count_entries(dir: &Path) -> usize {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

// =========================================================================
// Inference stand-in
// =========================================================================

#[derive(Debug, Clone)]
enum Behaviour {
    Paint { frames: usize },
    FailAfterWriting(InferenceError),
    CorruptFrame { frames: usize, corrupt: usize },
    Silent,
}

/// An [`Inference`] that writes a painted result (and frames) the way the
/// real collaborator lays them out, without running a model.
///
/// Clones share the record of inputs seen.
#[derive(Debug, Clone)]
pub struct FakeInference {
    behaviour: Behaviour,
    inputs: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeInference {
    fn with(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Succeed, writing the result and `frames` frames when animation is
    /// requested.
    pub fn painting(frames: usize) -> Self {
        Self::with(Behaviour::Paint { frames })
    }

    /// Write partial output, then fail with `err`.
    pub fn failing_after_writing(err: InferenceError) -> Self {
        Self::with(Behaviour::FailAfterWriting(err))
    }

    /// Succeed, but frame number `corrupt` of `frames` holds bytes no
    /// decoder accepts.
    pub fn with_corrupt_frame(frames: usize, corrupt: usize) -> Self {
        Self::with(Behaviour::CorruptFrame { frames, corrupt })
    }

    /// Succeed without writing anything.
    pub fn silent() -> Self {
        Self::with(Behaviour::Silent)
    }

    /// Inputs of every call so far, in order.
    pub fn inputs(&self) -> Vec<PathBuf> {
        self.inputs.lock().unwrap().clone()
    }

    fn write_outputs(job: &InferenceJob<'_>, frames: usize) {
        let layout = OutputLayout::new(job.output_dir, job.input, "jpg").unwrap();
        let (width, height) = image::image_dimensions(job.input).unwrap();
        create_test_rgb(&layout.result_path(), width, height);
        if job.need_animation && frames > 0 {
            std::fs::create_dir_all(layout.frames_dir()).unwrap();
            for i in 0..frames {
                let frame = layout.frames_dir().join(format!("{i:04}.jpg"));
                create_frame(&frame, width, height, i);
            }
        }
    }
}

impl Inference for FakeInference {
    fn run(&self, job: &InferenceJob<'_>) -> Result<(), InferenceError> {
        self.inputs.lock().unwrap().push(job.input.to_path_buf());
        match &self.behaviour {
            Behaviour::Paint { frames } => {
                Self::write_outputs(job, *frames);
                Ok(())
            }
            Behaviour::FailAfterWriting(err) => {
                Self::write_outputs(job, 2);
                Err(err.clone())
            }
            Behaviour::CorruptFrame { frames, corrupt } => {
                Self::write_outputs(job, *frames);
                let layout = OutputLayout::new(job.output_dir, job.input, "jpg").unwrap();
                let bad = layout.frames_dir().join(format!("{corrupt:04}.jpg"));
                std::fs::write(bad, b"not a jpeg").unwrap();
                Ok(())
            }
            Behaviour::Silent => Ok(()),
        }
    }
}
