use ndarray::{Array, Array3, Axis, Dimension};

use crate::error::DataError;

/// A single mean and standard deviation over every feature value of the
/// selected records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarStats {
    pub mean: f32,
    pub std: f32,
}

impl ScalarStats {
    /// Population statistics over `features[indices]`, accumulated in f64.
    ///
    /// Fails on an empty selection and on a zero or non-finite std.
    pub fn fit(features: &Array3<f32>, indices: &[usize]) -> Result<Self, DataError> {
        let per_record = features.len_of(Axis(1)) * features.len_of(Axis(2));
        let count = (indices.len() * per_record) as f64;
        if count == 0.0 {
            return Err(DataError::DegenerateStats { mean: f64::NAN, std: f64::NAN });
        }

        let sum: f64 = indices
            .iter()
            .map(|&i| features.index_axis(Axis(0), i).iter().map(|&v| v as f64).sum::<f64>())
            .sum();
        let mean = sum / count;

        let sq: f64 = indices
            .iter()
            .map(|&i| {
                features
                    .index_axis(Axis(0), i)
                    .iter()
                    .map(|&v| (v as f64 - mean).powi(2))
                    .sum::<f64>()
            })
            .sum();
        let std = (sq / count).sqrt();

        if !mean.is_finite() || !std.is_finite() || std == 0.0 {
            return Err(DataError::DegenerateStats { mean, std });
        }
        Ok(Self {
            mean: mean as f32,
            std: std as f32,
        })
    }

    /// `(x - mean) / std`, element-wise, for a single tensor or a batch.
    pub fn scale<D: Dimension>(&self, x: &Array<f32, D>) -> Array<f32, D> {
        x.mapv(|v| (v - self.mean) / self.std)
    }

    pub fn scale_inplace<D: Dimension>(&self, x: &mut Array<f32, D>) {
        x.mapv_inplace(|v| (v - self.mean) / self.std);
    }

    pub fn unscale<D: Dimension>(&self, x: &Array<f32, D>) -> Array<f32, D> {
        x.mapv(|v| v * self.std + self.mean)
    }
}
