use emo_core::StoreError;
use emo_tools::ManifestError;
use thiserror::Error;

use crate::split::SplitKind;

/// Errors raised while building datasets, splits and batch generators.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("invalid split {0:?}: expected \"train\" or \"validate\"")]
    InvalidSplit(String),

    #[error("{0} split is empty")]
    EmptySplit(SplitKind),

    #[error("degenerate scalar statistics: mean {mean}, std {std}")]
    DegenerateStats { mean: f64, std: f64 },

    #[error("batch size must be positive")]
    InvalidBatchSize,

    #[error("label {0:?} is not in the vocabulary")]
    UnknownLabel(String),

    #[error("invalid label vocabulary: {0}")]
    InvalidVocabulary(String),

    #[error("store has no emotion labels")]
    MissingLabels,

    #[error("dataset columns disagree: {filenames} filenames, {features} features, {labels} labels")]
    LengthMismatch {
        filenames: usize,
        features: usize,
        labels: usize,
    },

    #[error("split was resolved on {expected} records, dataset has {got}")]
    RecordCountMismatch { expected: usize, got: usize },

    #[error("frame shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
