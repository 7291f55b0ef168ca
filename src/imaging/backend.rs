//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three pixel operations the pipeline
//! needs: identify, resize, and animate.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Stage logic (normalization, frame assembly) only talks to this
//! trait, so it can be exercised against the recording [`tests::MockBackend`].

use super::params::{AnimationParams, ResizeParams};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend: Sync {
    /// Get image dimensions without decoding pixel data where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Resample `source` to exactly `width`×`height` and write it to `output`.
    /// The output encoding follows the output path's extension.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;

    /// Encode the frames, in the given order, into a looping animation.
    fn animate(&self, params: &AnimationParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::FrameDelay;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Mock backend that records operations without executing them.
    ///
    /// `identify` answers from a queue of dimensions (popped from the back);
    /// when the queue is empty it fails like an unreadable file would.
    #[derive(Default)]
    pub struct MockBackend {
        pub identify_results: Mutex<Vec<Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Resize {
            source: String,
            output: String,
            width: u32,
            height: u32,
        },
        Animate {
            frames: Vec<String>,
            output: String,
            delay_ms: u32,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                identify_results: Mutex::new(dims),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    fn lossy(path: &Path) -> String {
        path.to_string_lossy().to_string()
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(lossy(path)));

            self.identify_results
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| BackendError::ProcessingFailed("No mock dimensions".to_string()))
        }

        fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                source: lossy(&params.source),
                output: lossy(&params.output),
                width: params.width,
                height: params.height,
            });
            Ok(())
        }

        fn animate(&self, params: &AnimationParams) -> Result<(), BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Animate {
                frames: params.frames.iter().map(|p| lossy(p)).collect(),
                output: lossy(&params.output),
                delay_ms: params.delay.millis(),
            });
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "/test/image.jpg"));
    }

    #[test]
    fn mock_identify_without_dimensions_fails() {
        let backend = MockBackend::new();
        assert!(backend.identify(Path::new("/missing.png")).is_err());
    }

    #[test]
    fn mock_records_animation_frame_order() {
        let backend = MockBackend::new();

        backend
            .animate(&AnimationParams {
                frames: vec![PathBuf::from("/f/0000.jpg"), PathBuf::from("/f/0001.jpg")],
                output: "/out/animation.gif".into(),
                delay: FrameDelay::default(),
            })
            .unwrap();

        let ops = backend.get_operations();
        assert_eq!(
            ops,
            vec![RecordedOp::Animate {
                frames: vec!["/f/0000.jpg".into(), "/f/0001.jpg".into()],
                output: "/out/animation.gif".into(),
                delay_ms: 100,
            }]
        );
    }
}
