//! CLI output formatting.
//!
//! Every `format_*` function returns display lines and has a `print_*`
//! wrapper, so the text can be tested without capturing stdout.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! Painted portrait.jpg → portrait_painttransformed.gif
//!     Kind: animation
//!     Size: 512x384
//! ```
//!
//! With `--json`, the same facts as one JSON object (see [`ResultSummary`]).
//!
//! ## Failure
//!
//! An out-of-memory failure gets remediation hints; every other failure is a
//! single line.
//!
//! ```text
//! Out of accelerator memory
//!     Your image (4000x3000 pixels) is too large for the accelerator.
//!     Try:
//!     - enabling resize (drop --no-resize)
//!     ...
//!     Details: CUDA out of memory
//! ```
//!
//! ## Clear
//!
//! ```text
//! Cleared inference/output
//!     3 files, 1 directory
//! ```

use crate::pipeline::PipelineError;
use crate::store::ClearSummary;
use crate::types::{ProcessingResult, ResultKind};
use serde::Serialize;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// Process output
// ============================================================================

/// Machine-readable view of a result, printed with `--json`.
#[derive(Debug, Serialize)]
pub struct ResultSummary {
    pub path: String,
    pub kind: ResultKind,
    pub width: u32,
    pub height: u32,
    pub format: Option<String>,
}

impl ResultSummary {
    pub fn new(result: &ProcessingResult) -> Self {
        let asset = result.asset();
        Self {
            path: asset.path().display().to_string(),
            kind: result.kind(),
            width: asset.width(),
            height: asset.height(),
            format: asset
                .format()
                .and_then(|f| f.extensions_str().first())
                .map(|ext| ext.to_string()),
        }
    }
}

/// Format a finished request.
pub fn format_result(input: &Path, result: &ProcessingResult) -> Vec<String> {
    let asset = result.asset();
    let mut lines = vec![format!(
        "Painted {} → {}",
        file_name(input),
        asset.path().display()
    )];
    lines.push(format!("{}Kind: {}", indent(1), result.kind()));
    lines.push(format!(
        "{}Size: {}x{}",
        indent(1),
        asset.width(),
        asset.height()
    ));
    lines
}

pub fn print_result(input: &Path, result: &ProcessingResult) {
    for line in format_result(input, result) {
        println!("{}", line);
    }
}

pub fn format_result_json(result: &ProcessingResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ResultSummary::new(result))
}

// ============================================================================
// Failure output
// ============================================================================

/// Format a failed request.
///
/// `animate` and `resize` are the request's flags; they pick which hints
/// apply.
pub fn format_failure(err: &PipelineError, animate: bool, resize: bool) -> Vec<String> {
    match err {
        PipelineError::ResourceExhausted {
            width,
            height,
            detail,
        } => {
            let mut lines = vec!["Out of accelerator memory".to_string()];
            lines.push(format!(
                "{}Your image ({}x{} pixels) is too large for the accelerator.",
                indent(1),
                width,
                height
            ));
            lines.push(format!("{}Try:", indent(1)));
            if !resize {
                lines.push(format!("{}- enabling resize (drop --no-resize)", indent(1)));
            }
            lines.push(format!("{}- using a smaller input image", indent(1)));
            lines.push(format!(
                "{}- closing other applications that use the GPU",
                indent(1)
            ));
            if animate {
                lines.push(format!("{}- processing without --animation", indent(1)));
            }
            lines.push(format!("{}Details: {}", indent(1), detail));
            lines
        }
        other => vec![format!("Processing failed: {}", other)],
    }
}

pub fn print_failure(err: &PipelineError, animate: bool, resize: bool) {
    for line in format_failure(err, animate, resize) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Clear output
// ============================================================================

pub fn format_clear(root: &Path, summary: &ClearSummary) -> Vec<String> {
    if summary.is_empty() {
        return vec![format!("Nothing to clear in {}", root.display())];
    }
    vec![
        format!("Cleared {}", root.display()),
        format!(
            "{}{}, {}",
            indent(1),
            plural(summary.files, "file", "files"),
            plural(summary.dirs, "directory", "directories")
        ),
    ]
}

pub fn print_clear(root: &Path, summary: &ClearSummary) {
    for line in format_clear(root, summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImageAsset;

    fn animated() -> ProcessingResult {
        ProcessingResult::Animated(ImageAsset::new(
            Path::new("photos/cat_painttransformed.gif"),
            512,
            384,
        ))
    }

    // =========================================================================
    // Process output
    // =========================================================================

    #[test]
    fn result_lines() {
        let lines = format_result(Path::new("photos/cat.jpg"), &animated());
        assert_eq!(
            lines,
            [
                "Painted cat.jpg → photos/cat_painttransformed.gif",
                "    Kind: animation",
                "    Size: 512x384",
            ]
        );
    }

    #[test]
    fn result_json_fields() {
        let json = format_result_json(&animated()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "animated");
        assert_eq!(value["width"], 512);
        assert_eq!(value["height"], 384);
        assert_eq!(value["format"], "gif");
        assert_eq!(value["path"], "photos/cat_painttransformed.gif");
    }

    #[test]
    fn result_json_unknown_format_is_null() {
        let result = ProcessingResult::Static(ImageAsset::new(Path::new("out/cat"), 1, 1));
        let value: serde_json::Value =
            serde_json::from_str(&format_result_json(&result).unwrap()).unwrap();
        assert!(value["format"].is_null());
        assert_eq!(value["kind"], "static");
    }

    // =========================================================================
    // Failure output
    // =========================================================================

    fn oom() -> PipelineError {
        PipelineError::ResourceExhausted {
            width: 4000,
            height: 3000,
            detail: "CUDA out of memory".into(),
        }
    }

    #[test]
    fn oom_reports_dimensions_and_hints() {
        let lines = format_failure(&oom(), true, false);
        assert_eq!(lines[0], "Out of accelerator memory");
        assert!(lines[1].contains("4000x3000"));
        assert!(lines.iter().any(|l| l.contains("enabling resize")));
        assert!(lines.iter().any(|l| l.contains("without --animation")));
        assert_eq!(lines.last().unwrap(), "    Details: CUDA out of memory");
    }

    #[test]
    fn oom_hints_skip_options_already_taken() {
        let lines = format_failure(&oom(), false, true);
        assert!(!lines.iter().any(|l| l.contains("enabling resize")));
        assert!(!lines.iter().any(|l| l.contains("--animation")));
        assert!(lines.iter().any(|l| l.contains("smaller input image")));
    }

    #[test]
    fn other_failure_is_one_line() {
        let err = PipelineError::InferenceFailure("bad model".into());
        assert_eq!(
            format_failure(&err, false, true),
            ["Processing failed: Inference failed: bad model"]
        );
    }

    // =========================================================================
    // Clear output
    // =========================================================================

    #[test]
    fn clear_counts() {
        let lines = format_clear(
            Path::new("inference/output"),
            &ClearSummary { files: 3, dirs: 1 },
        );
        assert_eq!(lines, ["Cleared inference/output", "    3 files, 1 directory"]);
    }

    #[test]
    fn clear_nothing() {
        let lines = format_clear(Path::new("inference/output"), &ClearSummary::default());
        assert_eq!(lines, ["Nothing to clear in inference/output"]);
    }
}
