//! The end-to-end pipeline for one request.
//!
//! ```text
//! Idle ─┬─ resize ──▶ Normalizing ─┐
//!       └─────────────────────────┴▶ Invoking ─┬─ animate ──▶ Assembling ─▶ Succeeded
//!                                               ├─────────────────────────▶ Succeeded
//!                                               └─ error ───────────────────▶ Failed
//! ```
//!
//! Whether a request succeeds, fails, or panics partway through a stage, its
//! [`ResourceGuard`] deletes every temp artifact before control returns to
//! the caller.
//!
//! The orchestrator does not retry. Inference failures reach the caller with
//! their kind intact so a front-end can suggest the right fix.

use crate::assemble::{self, AssembleError};
use crate::config::PipelineConfig;
use crate::guard::ResourceGuard;
use crate::imaging::{BackendError, FrameDelay, ImageBackend, NormalizeError, normalize};
use crate::inference::{Inference, InferenceError, InferenceJob, OutputLayout};
use crate::naming::align_extension;
use crate::store::{ClearSummary, StoreSession};
use crate::types::{ImageAsset, ProcessingRequest, ProcessingResult};
use log::{debug, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Out of accelerator memory on a {width}x{height} image: {detail}")]
    ResourceExhausted {
        width: u32,
        height: u32,
        detail: String,
    },
    #[error("Inference failed: {0}")]
    InferenceFailure(String),
    #[error("Inference wrote no result at {0}")]
    MissingResult(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
}

impl From<NormalizeError> for PipelineError {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::InvalidConfiguration(msg) => PipelineError::InvalidConfiguration(msg),
            NormalizeError::Io(e) => PipelineError::Io(e),
            NormalizeError::Imaging(e) => PipelineError::Imaging(e),
        }
    }
}

impl From<AssembleError> for PipelineError {
    fn from(err: AssembleError) -> Self {
        match err {
            AssembleError::Io(e) => PipelineError::Io(e),
            AssembleError::Imaging(e) => PipelineError::Imaging(e),
            AssembleError::MissingResult(path) => PipelineError::MissingResult(path),
        }
    }
}

/// Where a request is in the pipeline. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Normalizing,
    Invoking,
    Assembling,
    Succeeded,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::Normalizing => "normalizing",
            Stage::Invoking => "invoking",
            Stage::Assembling => "assembling",
            Stage::Succeeded => "succeeded",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!("pipeline: {} → {}", stage, next);
    *stage = next;
}

/// Settings that stay fixed across requests.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    /// Bounding box for normalization.
    pub max_dim: u32,
    /// Model artifact handed to inference.
    pub model: PathBuf,
    /// Extension of the frames inference writes, without the dot.
    pub frame_extension: String,
    pub frame_delay: FrameDelay,
    /// Where temp artifacts go; the system temp dir when `None`.
    pub temp_dir: Option<PathBuf>,
}

impl PipelineSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_dim: config.resize.max_dim,
            model: PathBuf::from(&config.inference.model),
            frame_extension: config.animation.frame_extension.clone(),
            frame_delay: FrameDelay::from_millis(config.animation.frame_delay_ms),
            temp_dir: config.store.temp_dir.as_ref().map(PathBuf::from),
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.max_dim == 0 {
            return Err(PipelineError::InvalidConfiguration(
                "max_dim must be greater than zero".into(),
            ));
        }
        if self.frame_extension.is_empty() || self.frame_extension.starts_with('.') {
            return Err(PipelineError::InvalidConfiguration(format!(
                "frame extension must be non-empty and without a leading dot, got {:?}",
                self.frame_extension
            )));
        }
        Ok(())
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

/// Runs requests through normalize → infer → assemble.
pub struct Orchestrator<B, I> {
    backend: B,
    inference: I,
    settings: PipelineSettings,
}

impl<B: ImageBackend, I: Inference> Orchestrator<B, I> {
    pub fn new(backend: B, inference: I, settings: PipelineSettings) -> Self {
        Self {
            backend,
            inference,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Open an input image as an asset for a [`ProcessingRequest`].
    pub fn open(&self, path: &Path) -> Result<ImageAsset, PipelineError> {
        Ok(crate::imaging::identify(&self.backend, path)?)
    }

    /// Run one request against the store held by `session`.
    ///
    /// Temp artifacts created along the way are gone by the time this returns,
    /// whichever way it returns.
    pub fn process(
        &self,
        session: &StoreSession<'_>,
        request: &ProcessingRequest,
    ) -> Result<ProcessingResult, PipelineError> {
        self.settings.validate()?;

        let mut guard = match &self.settings.temp_dir {
            Some(dir) => ResourceGuard::in_dir(dir),
            None => ResourceGuard::new(),
        };
        let mut stage = Stage::Idle;

        let outcome = self.run(session, request, &mut guard, &mut stage);
        match &outcome {
            Ok(result) => {
                advance(&mut stage, Stage::Succeeded);
                info!(
                    "Produced {} at {}",
                    result.kind(),
                    result.asset().path().display()
                );
            }
            Err(err) => {
                advance(&mut stage, Stage::Failed);
                warn!("Request for {} failed: {}", request.source.path().display(), err);
            }
        }

        let removed = guard.cleanup();
        debug!("Cleaned up {removed} temp artifacts");
        outcome
    }

    /// Delete everything previous requests left in the store.
    pub fn clear_output_store(&self, session: &StoreSession<'_>) -> Result<ClearSummary, PipelineError> {
        Ok(session.clear()?)
    }

    fn run(
        &self,
        session: &StoreSession<'_>,
        request: &ProcessingRequest,
        guard: &mut ResourceGuard,
        stage: &mut Stage,
    ) -> Result<ProcessingResult, PipelineError> {
        let mut input = if request.resize {
            advance(stage, Stage::Normalizing);
            normalize(&self.backend, &request.source, self.settings.max_dim, guard)?
        } else {
            request.source.clone()
        };

        advance(stage, Stage::Invoking);
        if inside_store(session, input.path()) {
            // Inference writes over store files, and discard deletes them
            input = copy_to_temp(&input, guard)?;
        }
        let layout = self.layout_for(session, &input)?;
        if request.animate {
            // Frames only live until they are assembled
            guard.track_dir(&layout.frames_dir());
        }
        self.invoke(&input, &request.source, &layout, request.animate)
            .inspect_err(|_| session.discard(&layout))?;

        let result = if request.animate {
            advance(stage, Stage::Assembling);
            assemble::assemble(
                &self.backend,
                &layout,
                &session.animation_path(),
                self.settings.frame_delay,
            )?
        } else {
            assemble::static_result(&self.backend, &layout)?
        };

        match &request.output_path {
            Some(target) => deliver(result, target),
            None => Ok(result),
        }
    }

    fn layout_for(
        &self,
        session: &StoreSession<'_>,
        input: &ImageAsset,
    ) -> Result<OutputLayout, PipelineError> {
        session
            .layout_for(input.path(), &self.settings.frame_extension)
            .ok_or_else(|| {
                PipelineError::InvalidConfiguration(format!(
                    "input path has no file name: {}",
                    input.path().display()
                ))
            })
    }

    /// Run inference on `input`. Out-of-memory failures report the size of
    /// `source`, the image the caller asked for.
    fn invoke(
        &self,
        input: &ImageAsset,
        source: &ImageAsset,
        layout: &OutputLayout,
        animate: bool,
    ) -> Result<(), PipelineError> {
        let job = InferenceJob {
            input: input.path(),
            model: &self.settings.model,
            output_dir: layout.root(),
            need_animation: animate,
            serial: animate,
        };
        info!(
            "Running inference on {} ({}x{}{})",
            input.path().display(),
            input.width(),
            input.height(),
            if animate { ", with frames" } else { "" }
        );

        self.inference.run(&job).map_err(|err| match err {
            InferenceError::ResourceExhausted(detail) => PipelineError::ResourceExhausted {
                width: source.width(),
                height: source.height(),
                detail,
            },
            InferenceError::Failed(detail) => PipelineError::InferenceFailure(detail),
        })
    }
}

/// Whether `path` lives anywhere under the store root.
fn inside_store(session: &StoreSession<'_>, path: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return false;
    };
    let parent = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    match (std::fs::canonicalize(parent), std::fs::canonicalize(session.root())) {
        (Ok(dir), Ok(root)) => dir.starts_with(root),
        _ => parent.starts_with(session.root()),
    }
}

/// Copy `asset` to a guard-owned temp file with the same extension.
fn copy_to_temp(asset: &ImageAsset, guard: &mut ResourceGuard) -> Result<ImageAsset, PipelineError> {
    let suffix = asset
        .path()
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let copy = guard.create_file(&suffix)?;
    std::fs::copy(asset.path(), &copy)?;
    debug!(
        "Copied {} to {} before inference",
        asset.path().display(),
        copy.display()
    );
    Ok(asset.relocated(&copy))
}

/// Move the final artifact to where the caller asked for it.
fn deliver(result: ProcessingResult, requested: &Path) -> Result<ProcessingResult, PipelineError> {
    let target = align_extension(requested, result.asset().path());
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    move_file(result.asset().path(), &target)?;
    debug!("Delivered result to {}", target.display());
    Ok(result.map_asset(|asset| asset.relocated(&target)))
}

/// Rename, falling back to copy + remove when `from` and `to` are on
/// different filesystems.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)
}
