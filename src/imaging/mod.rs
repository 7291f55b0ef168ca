//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Normalize** | Lanczos3 `resize_exact` → PNG temp artifact |
//! | **Animate** | `GifEncoder` with infinite repeat, rayon frame decoding |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::fit_within;
pub use operations::{DEFAULT_MAX_DIM, NormalizeError, identify, normalize};
pub use params::{AnimationParams, FrameDelay, ResizeParams};
pub use rust_backend::RustBackend;
