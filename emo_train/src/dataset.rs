use std::path::Path;
use std::time::Instant;

use emo_core::FeatureStore;
use ndarray::{Array3, Axis};
use tracing::info;

use crate::error::DataError;
use crate::labels::LabelVocabulary;

/// A labelled development dataset: filenames, `(N, seq_len, mel_bins)`
/// features and label codes, indexed `0..N`. Read-only once built.
#[derive(Debug, Clone)]
pub struct Dataset {
    filenames: Vec<String>,
    features: Array3<f32>,
    labels: Vec<usize>,
}

impl Dataset {
    pub fn new(filenames: Vec<String>, features: Array3<f32>, labels: Vec<usize>) -> Result<Self, DataError> {
        let n = features.len_of(Axis(0));
        if filenames.len() != n || labels.len() != n {
            return Err(DataError::LengthMismatch {
                filenames: filenames.len(),
                features: n,
                labels: labels.len(),
            });
        }
        Ok(Self {
            filenames,
            features,
            labels,
        })
    }

    /// Encode the store's emotion labels with `vocab`.
    pub fn from_store(store: FeatureStore, vocab: &LabelVocabulary) -> Result<Self, DataError> {
        let raw = store.emotion_labels.ok_or(DataError::MissingLabels)?;
        let labels = raw
            .iter()
            .map(|label| vocab.code(label))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(store.filenames, store.features, labels)
    }

    pub fn load<P: AsRef<Path>>(path: P, vocab: &LabelVocabulary) -> Result<Self, DataError> {
        let load_time = Instant::now();
        let dataset = Self::from_store(FeatureStore::load(path.as_ref())?, vocab)?;
        info!(
            path = %path.as_ref().display(),
            records = dataset.len(),
            elapsed_ms = load_time.elapsed().as_millis() as u64,
            "loaded development features"
        );
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn features(&self) -> &Array3<f32> {
        &self.features
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// `(seq_len, mel_bins)` of every record.
    pub fn frame_shape(&self) -> (usize, usize) {
        (self.features.len_of(Axis(1)), self.features.len_of(Axis(2)))
    }
}

/// An unlabelled dataset scored with statistics from a development split.
#[derive(Debug, Clone)]
pub struct TestDataset {
    filenames: Vec<String>,
    features: Array3<f32>,
}

impl TestDataset {
    pub fn new(filenames: Vec<String>, features: Array3<f32>) -> Result<Self, DataError> {
        let n = features.len_of(Axis(0));
        if filenames.len() != n {
            return Err(DataError::LengthMismatch {
                filenames: filenames.len(),
                features: n,
                labels: 0,
            });
        }
        Ok(Self { filenames, features })
    }

    /// Any labels in the store are ignored.
    pub fn from_store(store: FeatureStore) -> Result<Self, DataError> {
        Self::new(store.filenames, store.features)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let load_time = Instant::now();
        let dataset = Self::from_store(FeatureStore::load(path.as_ref())?)?;
        info!(
            path = %path.as_ref().display(),
            records = dataset.len(),
            elapsed_ms = load_time.elapsed().as_millis() as u64,
            "loaded test features"
        );
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn features(&self) -> &Array3<f32> {
        &self.features
    }

    pub fn frame_shape(&self) -> (usize, usize) {
        (self.features.len_of(Axis(1)), self.features.len_of(Axis(2)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vocab() -> LabelVocabulary {
        let aliases = HashMap::from([("rab".to_string(), "anger".to_string())]);
        LabelVocabulary::new(vec!["anger".into(), "neutral".into()], aliases).unwrap()
    }

    fn store(labels: Option<Vec<&str>>) -> FeatureStore {
        FeatureStore {
            filenames: vec!["a.wav".into(), "b.wav".into()],
            features: Array3::zeros((2, 5, 3)),
            emotion_labels: labels.map(|l| l.into_iter().map(String::from).collect()),
        }
    }

    #[test]
    fn encodes_labels_through_aliases() {
        let ds = Dataset::from_store(store(Some(vec!["rab", "neutral"])), &vocab()).unwrap();
        assert_eq!(ds.labels(), &[0, 1]);
        assert_eq!(ds.frame_shape(), (5, 3));
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn unlabelled_store_is_not_a_dataset() {
        assert!(matches!(
            Dataset::from_store(store(None), &vocab()),
            Err(DataError::MissingLabels)
        ));
        assert_eq!(TestDataset::from_store(store(None)).unwrap().len(), 2);
    }

    #[test]
    fn unknown_label_fails_load() {
        assert!(matches!(
            Dataset::from_store(store(Some(vec!["rab", "pau"])), &vocab()),
            Err(DataError::UnknownLabel(_))
        ));
    }

    #[test]
    fn column_lengths_must_agree() {
        let err = Dataset::new(vec!["a.wav".into()], Array3::zeros((2, 1, 1)), vec![0, 0]).unwrap_err();
        assert!(matches!(err, DataError::LengthMismatch { filenames: 1, features: 2, labels: 2 }));
    }
}
