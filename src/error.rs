use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Contract violations and I/O failures surfaced by the layers, the loss,
/// the metrics and the dataset decoder.
#[derive(Error, Debug)]
pub enum Error {
    /// `backward` was called on a layer with no cached forward input.
    #[error("{layer}: backward called without a preceding forward")]
    UninitializedCache { layer: &'static str },

    /// Operand shapes are incompatible. Shapes are `(rows, cols)`.
    #[error("shape mismatch in {op}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        op: &'static str,
        expected: (usize, usize),
        got: (usize, usize),
    },

    /// A label outside `[0, num_classes)`.
    #[error("label {label} at sample {index} is out of range for {num_classes} classes")]
    LabelOutOfRange {
        index: usize,
        label: usize,
        num_classes: usize,
    },

    /// A batch with zero samples was passed to the loss or a metric.
    #[error("empty batch")]
    EmptyBatch,

    /// Malformed dataset file.
    #[error("dataset: {0}")]
    Dataset(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn shape(op: &'static str, expected: (usize, usize), got: (usize, usize)) -> Error {
        Error::ShapeMismatch { op, expected, got }
    }
}
