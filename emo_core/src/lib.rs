//! Log-mel feature extraction for speech emotion recordings.
//!
//! - [`audio`] — decoding, the log-mel transform and length padding
//! - [`store`] — the persisted feature store shared by extraction and training
//! - [`config`] — extraction parameters that fix the stored tensor shape

pub mod audio;
pub mod config;
pub mod error;
pub mod store;

pub use audio::{decode_to_mono, repeat_to_length, LogMelExtractor};
pub use config::ExtractionConfig;
pub use error::{FeatureError, StoreError};
pub use store::{FeatureStore, FeatureStoreWriter};
