//! Error type shared by the geometry, embedding and routing stages.
use std::path::PathBuf;

/// Failures raised by the preprocessing and routing front end.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("crop margins must be non-negative, got ({0:.3}, {1:.3})")]
    NegativeMargin(f64, f64),

    #[error("image list is empty")]
    EmptyImageList,

    #[error("images in a list must share one size: expected {expected:?}, found {found:?}")]
    InconsistentSizes {
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("depth map is {depth_w}x{depth_h} but images are {image_w}x{image_h}")]
    DepthShapeMismatch {
        depth_w: usize,
        depth_h: usize,
        image_w: u32,
        image_h: u32,
    },

    #[error("invalid crop box ({left}, {top}, {right}, {bottom})")]
    InvalidCropBox {
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
    },

    #[error("target resolution must be positive, got {0}x{1}")]
    InvalidResolution(u32, u32),

    #[error("image batch should be in landscape mode, got W={width} H={height}")]
    NotLandscape { width: usize, height: usize },

    #[error("input {axis} ({size}) is not a multiple of patch size ({patch})")]
    NotPatchAligned {
        axis: &'static str,
        size: usize,
        patch: usize,
    },

    #[error("input size {found:?} does not match model input size {expected:?}")]
    ImageSizeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("expected {expected} channels, got {found}")]
    ChannelMismatch { expected: usize, found: usize },

    #[error("true_shape has {found} entries for a batch of {batch}")]
    TrueShapeMismatch { batch: usize, found: usize },

    #[error("batch is empty")]
    EmptyBatch,

    #[error("true shapes must all be identical when routing is disabled")]
    HeterogeneousShapes,

    #[error("projection weight shape {found:?} is inconsistent: {reason}")]
    InvalidWeights {
        found: Vec<usize>,
        reason: &'static str,
    },

    #[error("head output `{0}` is missing from one orientation subset")]
    MissingOutput(String),

    #[error("head output `{name}` has trailing shape {found:?}, expected {expected:?}")]
    OutputShapeMismatch {
        name: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("head output `{name}` has {ndim} axes; transposing needs at least 3")]
    NotSpatial { name: String, ndim: usize },

    #[error("row count mismatch: {indices} indices for {rows} rows")]
    RowCountMismatch { indices: usize, rows: usize },

    #[error("row shape {found:?} does not fit destination rows of shape {expected:?}")]
    RowShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("row index {index} out of bounds for {rows} rows")]
    RowOutOfBounds { index: usize, rows: usize },

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("I/O error for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error for {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("image error for {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
