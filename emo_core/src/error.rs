use thiserror::Error;

/// Errors raised while turning a waveform into a fixed-shape log-mel tensor.
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("invalid extraction config: {0}")]
    InvalidConfig(String),

    #[error("audio too short: need at least {min_samples} samples, got {got_samples}")]
    AudioTooShort { min_samples: usize, got_samples: usize },

    #[error("cannot repeat an empty frame sequence")]
    EmptyFrames,
}

/// Errors raised by the persisted feature store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store header is not valid json: {0}")]
    Header(#[from] serde_json::Error),

    #[error("frame shape mismatch for {filename}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        filename: String,
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("cannot mix labelled and unlabelled records (at {0})")]
    MixedLabels(String),

    #[error("corrupt store: {0}")]
    Corrupt(String),
}
