//! # Painterly
//!
//! Turns a photo into a painting with a neural stroke-painting model, and
//! optionally into a looping GIF of the painting process.
//!
//! The model itself is a collaborator this crate does not implement. The
//! crate runs everything around it: fitting the input to a size the
//! accelerator can handle, calling inference, collecting what it wrote,
//! assembling frames, and making sure nothing temporary outlives the request.
//!
//! # Architecture: One Request, Three Stages
//!
//! ```text
//! 1. Normalize  input.jpg  →  painterly-XXXX.png   (fit within max_dim, temp)
//! 2. Infer      image      →  store/<name>         (+ store/<stem>/NNNN.jpg frames)
//! 3. Assemble   frames     →  store/animation.gif  (or the static result)
//! ```
//!
//! Each stage is skippable: normalization when resize is off or the image
//! already fits, assembly when no animation was asked for or inference wrote
//! no frames. The [`pipeline::Orchestrator`] drives the stages and owns the
//! request's [`guard::ResourceGuard`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Orchestrator: the per-request state machine and error mapping |
//! | [`imaging`] | Pure-Rust image operations: identify, normalize, GIF encoding |
//! | [`inference`] | The inference contract: output layout, job, error kinds, command adapter |
//! | [`assemble`] | Frame collection and GIF assembly with static fallback |
//! | [`store`] | The output store: serialized access, `clear`, discarding partial output |
//! | [`guard`] | Scoped ownership of temp files and frame directories |
//! | [`config`] | `painterly.toml` loading, validation, and merging |
//! | [`types`] | Shared request and result types |
//! | [`naming`] | Result file names and frame ordering |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Inference Is an Adapter
//!
//! The pipeline only sees the [`inference::Inference`] trait and the
//! [`inference::OutputLayout`] it must produce. The shipped adapter runs an
//! external program; tests substitute a fake that writes the same layout.
//! Failures come back typed, so "out of memory" can be told apart from
//! everything else and answered with a concrete fix.
//!
//! ## Serialized Store Access
//!
//! The store uses fixed names (`animation.gif`, one result per input name).
//! Rather than making names unique, access is serialized through
//! [`store::OutputStore::lock`]: a request and a `clear` never interleave.

pub mod assemble;
pub mod config;
pub mod guard;
pub mod imaging;
pub mod inference;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
