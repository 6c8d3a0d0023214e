//! Image operations and codec helpers shared by the worker pool and the
//! HTTP layer.
//!
//! Every transform implements the single-method [`Operation`] contract. The
//! dispatch machinery in `manip-worker` only ever calls [`Operation::run`];
//! it never looks at which variant it is holding.

pub mod codec;
pub mod error;
pub mod operation;
pub mod ops;

pub use error::{CodecError, OperationError};
pub use operation::Operation;
pub use ops::{
    AddText, EdgeDetect, Invert, Morphology, MorphologyKind, RandomFilter, Reduce, Saturate,
    Shuffle,
};

/// Re-exported so downstream crates name the same image type.
pub use image::DynamicImage;
