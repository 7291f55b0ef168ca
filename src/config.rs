//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `painterly.toml`. Stock defaults
//! are the base layer; the user file only needs the keys it wants to change.
//! Command-line flags are applied on top of the loaded config by `main`.
//!
//! ## Config File Location
//!
//! `painterly` reads `painterly.toml` from the working directory, or the file
//! given with `--config`. Without a file, the stock defaults apply.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [resize]
//! enabled = true            # Fit inputs within max_dim before inference
//! max_dim = 512             # Longest side after resizing, in pixels
//!
//! [animation]
//! enabled = false           # Produce a GIF of the painting process
//! frame_extension = "jpg"   # Extension of frames written by inference
//! frame_delay_ms = 100      # Delay between GIF frames
//! file_name = "animation.gif"
//!
//! [inference]
//! program = "python"
//! args = ["-m", "inference"]
//! model = "inference/model.pth"
//! oom_markers = ["out of memory", "OutOfMemoryError"]
//!
//! [store]
//! root = "inference/output" # Where inference writes its outputs
//! temp_dir = "/tmp"         # Resized inputs (omit for the system temp dir)
//!
//! [processing]
//! max_processes = 4         # Frame decoding workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::DEFAULT_MAX_DIM;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "painterly.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `painterly.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input normalization.
    pub resize: ResizeConfig,
    /// Painting-process GIF settings.
    pub animation: AnimationConfig,
    /// How to run the inference collaborator.
    pub inference: InferenceConfig,
    /// Output store and temp file locations.
    pub store: StoreConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resize.max_dim == 0 {
            return Err(ConfigError::Validation(
                "resize.max_dim must be greater than zero".into(),
            ));
        }
        if self.animation.frame_extension.is_empty()
            || self.animation.frame_extension.starts_with('.')
        {
            return Err(ConfigError::Validation(
                "animation.frame_extension must be non-empty, without a leading dot".into(),
            ));
        }
        if self.animation.frame_delay_ms == 0 {
            return Err(ConfigError::Validation(
                "animation.frame_delay_ms must be greater than zero".into(),
            ));
        }
        if !self.animation.file_name.to_ascii_lowercase().ends_with(".gif")
            || self.animation.file_name.len() <= ".gif".len()
        {
            return Err(ConfigError::Validation(
                "animation.file_name must be a .gif file name".into(),
            ));
        }
        if Path::new(&self.animation.file_name).components().count() != 1 {
            return Err(ConfigError::Validation(
                "animation.file_name must not contain a directory".into(),
            ));
        }
        if self.inference.program.is_empty() {
            return Err(ConfigError::Validation(
                "inference.program must not be empty".into(),
            ));
        }
        if self.store.root.is_empty() {
            return Err(ConfigError::Validation(
                "store.root must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    pub enabled: bool,
    /// Longest side, in pixels, after fitting.
    pub max_dim: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_dim: DEFAULT_MAX_DIM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationConfig {
    pub enabled: bool,
    /// Extension (no dot) of the frame files inference writes.
    pub frame_extension: String,
    pub frame_delay_ms: u32,
    /// Name of the animation file inside the store root.
    pub file_name: String,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            frame_extension: "jpg".to_string(),
            frame_delay_ms: 100,
            file_name: "animation.gif".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InferenceConfig {
    pub program: String,
    /// Arguments placed before the per-request flags.
    pub args: Vec<String>,
    pub model: String,
    /// Case-insensitive substrings of stderr that mean "out of memory".
    pub oom_markers: Vec<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["-m".to_string(), "inference".to_string()],
            model: "inference/model.pth".to_string(),
            oom_markers: vec!["out of memory".to_string(), "OutOfMemoryError".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub root: String,
    /// Directory for resized inputs. When absent, the system temp dir.
    pub temp_dir: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: "inference/output".to_string(),
            temp_dir: None,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel frame-decoding workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least 1
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PipelineConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist, `Err` if it exists but
/// cannot be read or is not valid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the pipeline config.
///
/// With `Some(path)` the file must exist. With `None`, [`DEFAULT_CONFIG_FILE`]
/// in the working directory is used if present, else the stock defaults.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, ConfigError> {
    let overlay = match path {
        Some(path) => Some(toml::from_str(&fs::read_to_string(path)?)?),
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock `painterly.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Painterly Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Input normalization
# ---------------------------------------------------------------------------
[resize]
# Fit inputs within max_dim x max_dim before inference, keeping aspect ratio.
# Larger inputs need more accelerator memory; turn this off at your own risk.
enabled = true

# Longest side after resizing, in pixels.
max_dim = 512

# ---------------------------------------------------------------------------
# Painting-process animation
# ---------------------------------------------------------------------------
[animation]
# Produce a GIF of the painting process instead of only the final image.
enabled = false

# Extension of the per-step frames inference writes (without the dot).
frame_extension = "jpg"

# Delay between GIF frames, in milliseconds.
frame_delay_ms = 100

# File name of the animation inside the store root.
file_name = "animation.gif"

# ---------------------------------------------------------------------------
# Inference collaborator
# ---------------------------------------------------------------------------
[inference]
# Called as: <program> <args...> --input <image> --model <model>
#            --output-dir <store root> [--need-animation] [--serial]
program = "python"
args = ["-m", "inference"]

# Model weights handed to the collaborator.
model = "inference/model.pth"

# Substrings of the collaborator's stderr (case-insensitive) that mean it ran
# out of accelerator memory.
oom_markers = ["out of memory", "OutOfMemoryError"]

# ---------------------------------------------------------------------------
# Output store
# ---------------------------------------------------------------------------
[store]
# Directory inference writes results and frames into. `painterly clear`
# empties it.
root = "inference/output"

# Directory for resized inputs. Omit to use the system temp directory.
# temp_dir = "/tmp"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel frame-decoding workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
