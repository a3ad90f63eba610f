use serde::{Deserialize, Serialize};

use crate::error::FeatureError;

/// Parameters that fix the shape of every stored feature tensor.
///
/// Changing any of these invalidates an existing feature store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub sample_rate: u32,
    /// Analysis window length in samples (also the FFT length).
    pub window_size: usize,
    /// Samples shared by consecutive windows.
    pub overlap: usize,
    /// Frame count every record is padded to.
    pub seq_len: usize,
    pub mel_bins: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            window_size: 2048,
            overlap: 672,
            seq_len: 320,
            mel_bins: 64,
        }
    }
}

impl ExtractionConfig {
    pub fn hop(&self) -> usize {
        self.window_size - self.overlap
    }

    pub fn validate(&self) -> Result<(), FeatureError> {
        if self.sample_rate == 0 {
            return Err(FeatureError::InvalidConfig("sample_rate must be positive".into()));
        }
        if self.window_size == 0 || self.mel_bins == 0 || self.seq_len == 0 {
            return Err(FeatureError::InvalidConfig(
                "window_size, mel_bins and seq_len must be positive".into(),
            ));
        }
        if self.overlap >= self.window_size {
            return Err(FeatureError::InvalidConfig(format!(
                "overlap ({}) must be smaller than window_size ({})",
                self.overlap, self.window_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_hop() {
        let cfg = ExtractionConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.hop(), 1376);
    }

    #[test]
    fn rejects_overlap_not_below_window() {
        let cfg = ExtractionConfig {
            overlap: 2048,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(FeatureError::InvalidConfig(_))));
    }
}
