//! Mini-batch generation over a development dataset and a separate test dataset.
//!
//! [`DevelopmentSplit`] resolves the train / validate partitions once and fits
//! the scalar statistics on the train partition only. Generators borrow it
//! along with the dataset, so every split and the test data are scaled with
//! the same statistics.
//!
//! Each iterator owns its cursor; the train iterator also owns its random
//! stream.
//! - [`TrainBatches`] never ends; it reshuffles and restarts once the cursor
//!   passes the end of the partition.
//! - [`EvalBatches`] makes one pass, optionally shuffled, optionally capped.
//! - [`TestBatches`] makes one sequential pass over the test dataset.

use std::path::Path;

use ndarray::{Array3, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::dataset::{Dataset, TestDataset};
use crate::error::DataError;
use crate::scalar::ScalarStats;
use crate::split::{resolve_indices, SplitKind};

/// Seed for the train stream unless overridden.
pub const DEFAULT_SEED: u64 = 1234;
/// Seed for validation shuffling, independent of the train seed.
pub const VALIDATE_SEED: u64 = 0;

/// Train / validate partitions of a development dataset and the statistics
/// fitted on the train partition.
#[derive(Debug, Clone)]
pub struct DevelopmentSplit {
    train: Vec<usize>,
    validate: Vec<usize>,
    train_dropped: usize,
    validate_dropped: usize,
    stats: ScalarStats,
    records: usize,
    frame_shape: (usize, usize),
}

impl DevelopmentSplit {
    /// Resolve both partitions from manifest filename lists. A missing
    /// manifest selects the whole dataset for that partition.
    pub fn new<S: AsRef<str>>(
        dataset: &Dataset,
        train_manifest: Option<&[S]>,
        validate_manifest: Option<&[S]>,
    ) -> Result<Self, DataError> {
        let (train, train_dropped) = Self::resolve(dataset, SplitKind::Train, train_manifest);
        let (validate, validate_dropped) =
            Self::resolve(dataset, SplitKind::Validate, validate_manifest);

        info!(
            train = train.len(),
            validate = validate.len(),
            "split development data"
        );

        if train.is_empty() {
            return Err(DataError::EmptySplit(SplitKind::Train));
        }
        let stats = ScalarStats::fit(dataset.features(), &train)?;

        Ok(Self {
            train,
            validate,
            train_dropped,
            validate_dropped,
            stats,
            records: dataset.len(),
            frame_shape: dataset.frame_shape(),
        })
    }

    /// Same as [`DevelopmentSplit::new`], reading the manifests from disk.
    pub fn from_manifest_files(
        dataset: &Dataset,
        train_manifest: Option<&Path>,
        validate_manifest: Option<&Path>,
    ) -> Result<Self, DataError> {
        let train = train_manifest.map(emo_tools::read_manifest).transpose()?;
        let validate = validate_manifest.map(emo_tools::read_manifest).transpose()?;
        Self::new(dataset, train.as_deref(), validate.as_deref())
    }

    fn resolve<S: AsRef<str>>(
        dataset: &Dataset,
        kind: SplitKind,
        manifest: Option<&[S]>,
    ) -> (Vec<usize>, usize) {
        let Some(manifest) = manifest else {
            return ((0..dataset.len()).collect(), 0);
        };
        let resolution = resolve_indices(dataset.filenames(), manifest);
        if resolution.dropped > 0 {
            warn!(
                split = %kind,
                dropped = resolution.dropped,
                listed = manifest.len(),
                "manifest rows with no matching filename were skipped"
            );
        }
        (resolution.indices, resolution.dropped)
    }

    pub fn indices(&self, kind: SplitKind) -> &[usize] {
        match kind {
            SplitKind::Train => &self.train,
            SplitKind::Validate => &self.validate,
        }
    }

    /// Manifest rows skipped for lack of a matching filename.
    pub fn dropped(&self, kind: SplitKind) -> usize {
        match kind {
            SplitKind::Train => self.train_dropped,
            SplitKind::Validate => self.validate_dropped,
        }
    }

    pub fn stats(&self) -> ScalarStats {
        self.stats
    }

    /// Size of the dataset the split was resolved against.
    pub fn records(&self) -> usize {
        self.records
    }

    pub fn frame_shape(&self) -> (usize, usize) {
        self.frame_shape
    }

    /// Fails unless `dataset` has the size and frame shape this split was built on.
    pub fn check_dataset(&self, dataset: &Dataset) -> Result<(), DataError> {
        if dataset.len() != self.records {
            return Err(DataError::RecordCountMismatch {
                expected: self.records,
                got: dataset.len(),
            });
        }
        if dataset.frame_shape() != self.frame_shape {
            return Err(DataError::ShapeMismatch {
                expected: self.frame_shape,
                got: dataset.frame_shape(),
            });
        }
        Ok(())
    }
}

/// Read position into an index set and the number of batches produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCursor {
    pub pointer: usize,
    pub iteration: usize,
}

impl BatchCursor {
    /// Take the next `batch_size` window of `indices`, shortened at the end.
    fn advance<'i>(&mut self, indices: &'i [usize], batch_size: usize) -> &'i [usize] {
        let end = (self.pointer + batch_size).min(indices.len());
        let window = &indices[self.pointer.min(end)..end];
        self.pointer += batch_size;
        self.iteration += 1;
        window
    }
}

#[derive(Debug, Clone)]
pub struct TrainBatch {
    /// Dataset positions, in batch order.
    pub indices: Vec<usize>,
    /// Scaled features, `(batch, seq_len, mel_bins)`.
    pub features: Array3<f32>,
    pub labels: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct EvalBatch {
    pub indices: Vec<usize>,
    pub features: Array3<f32>,
    pub labels: Vec<usize>,
    pub filenames: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TestBatch {
    pub indices: Vec<usize>,
    pub features: Array3<f32>,
    pub filenames: Vec<String>,
}

fn gather_features(features: &Array3<f32>, stats: &ScalarStats, indices: &[usize]) -> Array3<f32> {
    let mut batch = features.select(Axis(0), indices);
    stats.scale_inplace(&mut batch);
    batch
}

/// Train and validation batch factory over a development dataset.
#[derive(Debug, Clone, Copy)]
pub struct BatchGenerator<'a> {
    dataset: &'a Dataset,
    split: &'a DevelopmentSplit,
    batch_size: usize,
    seed: u64,
}

impl<'a> BatchGenerator<'a> {
    pub fn new(
        dataset: &'a Dataset,
        split: &'a DevelopmentSplit,
        batch_size: usize,
    ) -> Result<Self, DataError> {
        if batch_size == 0 {
            return Err(DataError::InvalidBatchSize);
        }
        split.check_dataset(dataset)?;
        Ok(Self {
            dataset,
            split,
            batch_size,
            seed: DEFAULT_SEED,
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Endless shuffled batches over the train partition.
    pub fn train(&self) -> TrainBatches<'a> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut indices = self.split.indices(SplitKind::Train).to_vec();
        indices.shuffle(&mut rng);

        TrainBatches {
            dataset: self.dataset,
            stats: self.split.stats(),
            batch_size: self.batch_size,
            indices,
            cursor: BatchCursor::default(),
            rng,
        }
    }

    /// One pass over `kind`, stopping early after `max_iteration` batches.
    ///
    /// Shuffling always starts from [`VALIDATE_SEED`], so every shuffled pass
    /// over the same split yields the same order.
    pub fn validate(
        &self,
        kind: SplitKind,
        shuffle: bool,
        max_iteration: Option<usize>,
    ) -> EvalBatches<'a> {
        let mut indices = self.split.indices(kind).to_vec();
        if shuffle {
            indices.shuffle(&mut StdRng::seed_from_u64(VALIDATE_SEED));
        }
        info!(split = %kind, records = indices.len(), shuffle, "evaluating");

        EvalBatches {
            dataset: self.dataset,
            stats: self.split.stats(),
            batch_size: self.batch_size,
            indices,
            cursor: BatchCursor::default(),
            max_iteration,
        }
    }
}

/// Endless train iterator; `next` always returns `Some`.
#[derive(Debug, Clone)]
pub struct TrainBatches<'a> {
    dataset: &'a Dataset,
    stats: ScalarStats,
    batch_size: usize,
    indices: Vec<usize>,
    cursor: BatchCursor,
    rng: StdRng,
}

impl TrainBatches<'_> {
    pub fn cursor(&self) -> BatchCursor {
        self.cursor
    }

    /// Current epoch order of the train partition.
    pub fn order(&self) -> &[usize] {
        &self.indices
    }
}

impl Iterator for TrainBatches<'_> {
    type Item = TrainBatch;

    fn next(&mut self) -> Option<TrainBatch> {
        // The reset happens only once the pointer has passed the end, so the
        // last window of an epoch may be shorter than batch_size.
        if self.cursor.pointer >= self.indices.len() {
            self.cursor.pointer = 0;
            self.indices.shuffle(&mut self.rng);
        }

        let indices = self.cursor.advance(&self.indices, self.batch_size).to_vec();
        let features = gather_features(self.dataset.features(), &self.stats, &indices);
        let labels = indices.iter().map(|&i| self.dataset.labels()[i]).collect();

        Some(TrainBatch {
            indices,
            features,
            labels,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

/// Single-pass iterator over the train or validate partition.
#[derive(Debug, Clone)]
pub struct EvalBatches<'a> {
    dataset: &'a Dataset,
    stats: ScalarStats,
    batch_size: usize,
    indices: Vec<usize>,
    cursor: BatchCursor,
    max_iteration: Option<usize>,
}

impl EvalBatches<'_> {
    pub fn cursor(&self) -> BatchCursor {
        self.cursor
    }
}

impl Iterator for EvalBatches<'_> {
    type Item = EvalBatch;

    fn next(&mut self) -> Option<EvalBatch> {
        if self.max_iteration == Some(self.cursor.iteration) {
            return None;
        }
        if self.cursor.pointer >= self.indices.len() {
            return None;
        }

        let indices = self.cursor.advance(&self.indices, self.batch_size).to_vec();
        let features = gather_features(self.dataset.features(), &self.stats, &indices);
        let labels = indices.iter().map(|&i| self.dataset.labels()[i]).collect();
        let filenames = indices
            .iter()
            .map(|&i| self.dataset.filenames()[i].clone())
            .collect();

        Some(EvalBatch {
            indices,
            features,
            labels,
            filenames,
        })
    }
}

/// Batch factory over an external test dataset, scaled with development statistics.
#[derive(Debug, Clone, Copy)]
pub struct TestBatchGenerator<'a> {
    dataset: &'a TestDataset,
    stats: ScalarStats,
    batch_size: usize,
}

impl<'a> TestBatchGenerator<'a> {
    pub fn new(
        dataset: &'a TestDataset,
        split: &DevelopmentSplit,
        batch_size: usize,
    ) -> Result<Self, DataError> {
        if batch_size == 0 {
            return Err(DataError::InvalidBatchSize);
        }
        if !dataset.is_empty() && dataset.frame_shape() != split.frame_shape() {
            return Err(DataError::ShapeMismatch {
                expected: split.frame_shape(),
                got: dataset.frame_shape(),
            });
        }
        Ok(Self {
            dataset,
            stats: split.stats(),
            batch_size,
        })
    }

    /// One sequential pass over the test dataset.
    pub fn batches(&self) -> TestBatches<'a> {
        TestBatches {
            dataset: self.dataset,
            stats: self.stats,
            batch_size: self.batch_size,
            indices: (0..self.dataset.len()).collect(),
            cursor: BatchCursor::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TestBatches<'a> {
    dataset: &'a TestDataset,
    stats: ScalarStats,
    batch_size: usize,
    indices: Vec<usize>,
    cursor: BatchCursor,
}

impl Iterator for TestBatches<'_> {
    type Item = TestBatch;

    fn next(&mut self) -> Option<TestBatch> {
        if self.cursor.pointer >= self.indices.len() {
            return None;
        }

        let indices = self.cursor.advance(&self.indices, self.batch_size).to_vec();
        let features = gather_features(self.dataset.features(), &self.stats, &indices);
        let filenames = indices
            .iter()
            .map(|&i| self.dataset.filenames()[i].clone())
            .collect();

        Some(TestBatch {
            indices,
            features,
            filenames,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n: usize) -> Dataset {
        let filenames = (0..n).map(|i| format!("clip_{i:02}.wav")).collect();
        let features = Array3::from_shape_fn((n, 3, 2), |(r, t, m)| (r * 10 + t * 2 + m) as f32);
        let labels = (0..n).map(|i| i % 3).collect();
        Dataset::new(filenames, features, labels).unwrap()
    }

    fn whole(ds: &Dataset) -> DevelopmentSplit {
        DevelopmentSplit::new::<&str>(ds, None, None).unwrap()
    }

    #[test]
    fn cursor_windows_shrink_at_the_end() {
        let idx = [5, 6, 7, 8, 9];
        let mut cursor = BatchCursor::default();
        assert_eq!(cursor.advance(&idx, 2), &[5, 6]);
        assert_eq!(cursor.advance(&idx, 2), &[7, 8]);
        assert_eq!(cursor.advance(&idx, 2), &[9]);
        assert_eq!(cursor, BatchCursor { pointer: 6, iteration: 3 });
        assert!(cursor.advance(&idx, 2).is_empty());
    }

    #[test]
    fn ten_items_batch_four() {
        let ds = dataset(10);
        let split = whole(&ds);
        let generator = BatchGenerator::new(&ds, &split, 4).unwrap();
        let mut train = generator.train();

        let first_epoch = train.order().to_vec();
        let sizes: Vec<usize> = (0..3).map(|_| train.next().unwrap().indices.len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(train.cursor().pointer, 12);

        let fourth = train.next().unwrap();
        assert_eq!(fourth.indices.len(), 4);
        assert_eq!(train.cursor().pointer, 4);
        assert_eq!(fourth.indices, train.order()[..4].to_vec());
        let mut reshuffled = train.order().to_vec();
        assert_ne!(reshuffled, first_epoch);
        reshuffled.sort_unstable();
        assert_eq!(reshuffled, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn train_labels_follow_indices() {
        let ds = dataset(7);
        let split = whole(&ds);
        let mut train = BatchGenerator::new(&ds, &split, 3).unwrap().train();
        let batch = train.next().unwrap();
        assert_eq!(batch.features.dim(), (3, 3, 2));
        for (row, &i) in batch.indices.iter().enumerate() {
            assert_eq!(batch.labels[row], i % 3);
        }
    }

    #[test]
    fn validate_terminates_after_one_pass() {
        let ds = dataset(10);
        let split = whole(&ds);
        let generator = BatchGenerator::new(&ds, &split, 4).unwrap();
        let batches: Vec<EvalBatch> = generator.validate(SplitKind::Validate, false, None).collect();
        let sizes: Vec<usize> = batches.iter().map(|b| b.indices.len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(batches[2].filenames, vec!["clip_08.wav", "clip_09.wav"]);
    }

    #[test]
    fn validate_respects_max_iteration() {
        let ds = dataset(10);
        let split = whole(&ds);
        let generator = BatchGenerator::new(&ds, &split, 3).unwrap();
        assert_eq!(generator.validate(SplitKind::Train, true, Some(2)).count(), 2);
        assert_eq!(generator.validate(SplitKind::Train, true, Some(0)).count(), 0);
    }

    #[test]
    fn validate_shuffle_is_reproducible() {
        let ds = dataset(12);
        let split = whole(&ds);
        let a = BatchGenerator::new(&ds, &split, 5).unwrap();
        let b = BatchGenerator::new(&ds, &split, 5).unwrap().with_seed(99);
        let order = |g: &BatchGenerator<'_>| -> Vec<usize> {
            g.validate(SplitKind::Validate, true, None)
                .flat_map(|batch| batch.indices)
                .collect()
        };
        assert_eq!(order(&a), order(&b));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let ds = dataset(3);
        let split = whole(&ds);
        assert!(matches!(BatchGenerator::new(&ds, &split, 0), Err(DataError::InvalidBatchSize)));
    }

    #[test]
    fn empty_train_split_fails_fast() {
        let ds = dataset(3);
        let err = DevelopmentSplit::new(&ds, Some(&["missing.wav"][..]), None).unwrap_err();
        assert!(matches!(err, DataError::EmptySplit(SplitKind::Train)));
    }

    #[test]
    fn test_batches_use_development_stats() {
        let ds = dataset(6);
        let split = whole(&ds);
        let test = TestDataset::new(
            vec!["t0.wav".into(), "t1.wav".into(), "t2.wav".into()],
            Array3::from_elem((3, 3, 2), split.stats().mean),
        )
        .unwrap();
        let batches: Vec<TestBatch> = TestBatchGenerator::new(&test, &split, 2).unwrap().batches().collect();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].filenames, vec!["t2.wav"]);
        assert!(batches[0].features.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn split_from_another_dataset_is_rejected() {
        let big = dataset(10);
        let split = whole(&big);
        let small = dataset(3);
        assert!(matches!(
            BatchGenerator::new(&small, &split, 4),
            Err(DataError::RecordCountMismatch { expected: 10, got: 3 })
        ));

        let reshaped = Dataset::new(
            big.filenames().to_vec(),
            Array3::zeros((10, 4, 2)),
            big.labels().to_vec(),
        )
        .unwrap();
        assert!(matches!(
            BatchGenerator::new(&reshaped, &split, 4),
            Err(DataError::ShapeMismatch { expected: (3, 2), got: (4, 2) })
        ));
    }

    #[test]
    fn test_shape_must_match_development() {
        let ds = dataset(4);
        let split = whole(&ds);
        let test = TestDataset::new(vec!["t.wav".into()], Array3::zeros((1, 5, 2))).unwrap();
        assert!(matches!(
            TestBatchGenerator::new(&test, &split, 2),
            Err(DataError::ShapeMismatch { expected: (3, 2), got: (5, 2) })
        ));
    }
}
