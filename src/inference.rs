//! The neural painting stage, seen from the outside.
//!
//! Inference is a black box: given an input image, a model file and an output
//! directory, it writes its results to disk. This module pins down exactly
//! what it writes ([`OutputLayout`]), how it is called ([`Inference`]), and how
//! it fails ([`InferenceError`]). Nothing else in the crate depends on how the
//! collaborator works internally.
//!
//! [`CommandInference`] is the production adapter: it runs the collaborator
//! as an external program and maps its exit status and stderr onto
//! [`InferenceError`].

use crate::naming::{has_extension, sort_frames};
use log::{debug, info};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    /// The accelerator ran out of memory. Retrying with a smaller input
    /// usually helps; retrying as-is does not.
    #[error("out of accelerator memory: {0}")]
    ResourceExhausted(String),
    #[error("inference failed: {0}")]
    Failed(String),
}

/// Where the inference stage puts its outputs for one input image.
///
/// For an input named `<stem>.<ext>` and an output directory `root`:
///
/// ```text
/// root/
/// ├── <stem>.<ext>        # final painted image, same file name as the input
/// └── <stem>/             # only for animations: one frame per painting step
///     ├── 0000.jpg
///     ├── 0001.jpg
///     └── ...
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    file_name: OsString,
    stem: OsString,
    frame_extension: String,
}

impl OutputLayout {
    /// Layout for `input` inside `root`. Returns `None` if `input` has no
    /// file name (e.g. `/` or `..`).
    pub fn new(root: &Path, input: &Path, frame_extension: &str) -> Option<Self> {
        let file_name = input.file_name()?.to_os_string();
        let stem = input.file_stem()?.to_os_string();
        Some(Self {
            root: root.to_path_buf(),
            file_name,
            stem,
            frame_extension: frame_extension.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The static result image.
    pub fn result_path(&self) -> PathBuf {
        self.root.join(&self.file_name)
    }

    /// Directory holding the animation frames.
    pub fn frames_dir(&self) -> PathBuf {
        self.root.join(&self.stem)
    }

    pub fn is_frame(&self, path: &Path) -> bool {
        has_extension(path, &self.frame_extension)
    }

    /// Frames currently on disk, in display order.
    ///
    /// A missing frame directory is an empty sequence, not an error.
    pub fn frames(&self) -> io::Result<Vec<PathBuf>> {
        let dir = self.frames_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut frames = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file() && self.is_frame(&path) {
                frames.push(path);
            }
        }
        sort_frames(&mut frames);
        Ok(frames)
    }
}

/// Arguments of one inference call.
#[derive(Debug, Clone, Copy)]
pub struct InferenceJob<'a> {
    pub input: &'a Path,
    pub model: &'a Path,
    pub output_dir: &'a Path,
    /// Also write the per-step frames.
    pub need_animation: bool,
    /// Paint steps one after another instead of batched. Used together with
    /// `need_animation` so frames exist for every step.
    pub serial: bool,
}

/// The inference collaborator.
///
/// Implementations block until every output described by [`OutputLayout`]
/// has been written, or fail. They own any retry policy.
pub trait Inference {
    fn run(&self, job: &InferenceJob<'_>) -> Result<(), InferenceError>;
}

/// Runs inference as an external program.
///
/// The command line is `<program> <args…> --input <path> --model <path>
/// --output-dir <dir> [--need-animation] [--serial]`. Exit status 0 means
/// success. On failure, stderr is searched (case-insensitively) for any of
/// the out-of-memory markers to tell [`InferenceError::ResourceExhausted`]
/// apart from other failures.
#[derive(Debug, Clone)]
pub struct CommandInference {
    program: String,
    args: Vec<String>,
    oom_markers: Vec<String>,
}

impl CommandInference {
    pub fn new(program: impl Into<String>, args: Vec<String>, oom_markers: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            oom_markers,
        }
    }

    fn command(&self, job: &InferenceJob<'_>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--input")
            .arg(job.input)
            .arg("--model")
            .arg(job.model)
            .arg("--output-dir")
            .arg(job.output_dir);
        if job.need_animation {
            cmd.arg("--need-animation");
        }
        if job.serial {
            cmd.arg("--serial");
        }
        cmd
    }

    fn classify(&self, stderr: &str, status: &str) -> InferenceError {
        let lower = stderr.to_lowercase();
        let detail = last_line(stderr).unwrap_or(status).to_string();
        if self
            .oom_markers
            .iter()
            .any(|marker| lower.contains(&marker.to_lowercase()))
        {
            InferenceError::ResourceExhausted(detail)
        } else {
            InferenceError::Failed(detail)
        }
    }
}

/// Last non-blank line. For a Python traceback, that is the exception.
fn last_line(text: &str) -> Option<&str> {
    text.lines().rev().map(str::trim).find(|l| !l.is_empty())
}

impl Inference for CommandInference {
    fn run(&self, job: &InferenceJob<'_>) -> Result<(), InferenceError> {
        let mut cmd = self.command(job);
        debug!("Running inference: {:?}", cmd);

        let started = Instant::now();
        let output = cmd.output().map_err(|e| {
            InferenceError::Failed(format!("could not start `{}`: {}", self.program, e))
        })?;

        if output.status.success() {
            info!(
                "Inference finished in {:.1}s",
                started.elapsed().as_secs_f64()
            );
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(self.classify(&stderr, &output.status.to_string()))
    }
}
