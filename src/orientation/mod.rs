//! Orientation bookkeeping for mixed landscape/portrait batches.
mod router;
mod shape;

pub use router::{transposed, HeadOutput, LandscapeRouter, PredictionHead, POSE_KEY};
pub use shape::{landscape_dims, ImageShape, Orientation, OrientationSplit};
