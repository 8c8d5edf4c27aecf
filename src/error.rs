use std::io;

use thiserror::Error;

/// The crate's result type.
pub type Result<T> = std::result::Result<T, ValidError>;

/// Failures raised while scoring, tracking or checkpointing a model.
///
/// Every variant aborts the current validation pass; no batch is ever skipped.
#[derive(Debug, Error)]
pub enum ValidError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("checkpoint archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A full pass scored zero samples, so no ratio exists.
    #[error("validation set is empty: no samples were scored")]
    EmptyDataset,

    /// The score vector cannot be split evenly across the labels.
    #[error("score/label arity mismatch: {scores} scores cannot be split across {labels} labels")]
    ShapeMismatch { scores: usize, labels: usize },

    #[error("batch has {rows} input rows but {labels} labels")]
    BatchMismatch { rows: usize, labels: usize },

    #[error("batch_size must be at least 1")]
    ZeroBatchSize,

    #[error("label {label} is out of range for {num_classes} classes")]
    LabelOutOfRange { label: usize, num_classes: usize },

    #[error("matrix shape mismatch in {op}: {left:?} vs {right:?}")]
    Dimension {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("unknown validation metric '{0}'")]
    UnknownMetric(String),

    #[error("validation metric '{0}' is configured more than once")]
    DuplicateMetric(String),

    /// The archive was readable but does not describe a network.
    #[error("malformed checkpoint: {0}")]
    Checkpoint(String),
}
