//! Datasets, split resolution, scaling and mini-batch generation over
//! persisted log-mel features.

pub mod dataset;
pub mod error;
pub mod generator;
pub mod labels;
pub mod scalar;
pub mod split;

pub use dataset::{Dataset, TestDataset};
pub use error::DataError;
pub use generator::{
    BatchCursor, BatchGenerator, DevelopmentSplit, EvalBatch, EvalBatches, TestBatch,
    TestBatchGenerator, TestBatches, TrainBatch, TrainBatches, DEFAULT_SEED, VALIDATE_SEED,
};
pub use labels::LabelVocabulary;
pub use scalar::ScalarStats;
pub use split::{resolve_indices, SplitKind, SplitResolution};
