//! Single-file log-mel feature store.
//!
//! Layout:
//!
//! ```text
//! [u64 LE header length][JSON header][feature data, f32 LE, row-major N x S x M]
//! ```
//!
//! The header holds the `filename` array, an optional `emotion_label` array
//! (absent for unlabelled test stores) and the `feature` dtype and shape.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use ndarray::{Array3, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

const FEATURE_DTYPE: &str = "F32";

#[derive(Debug, Serialize, Deserialize)]
struct TensorInfo {
    dtype: String,
    shape: [usize; 3],
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreHeader {
    filename: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    emotion_label: Option<Vec<String>>,
    feature: TensorInfo,
}

/// A loaded feature store: parallel filename / feature / label sequences.
#[derive(Debug, Clone)]
pub struct FeatureStore {
    pub filenames: Vec<String>,
    /// `(N, seq_len, mel_bins)`.
    pub features: Array3<f32>,
    pub emotion_labels: Option<Vec<String>>,
}

impl FeatureStore {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let file = File::open(path.as_ref())?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut len_bytes = [0u8; 8];
        reader.read_exact(&mut len_bytes)?;
        let header_len = u64::from_le_bytes(len_bytes);
        let body_len = file_len.saturating_sub(8);
        if header_len > body_len {
            return Err(StoreError::Corrupt(format!(
                "header claims {header_len} bytes, file has {body_len}"
            )));
        }
        let header_len = usize::try_from(header_len)
            .map_err(|_| StoreError::Corrupt("header length overflows usize".into()))?;

        let mut header_bytes = vec![0u8; header_len];
        reader.read_exact(&mut header_bytes)?;
        let header: StoreHeader = serde_json::from_slice(&header_bytes)?;

        if header.feature.dtype != FEATURE_DTYPE {
            return Err(StoreError::Corrupt(format!(
                "unsupported feature dtype {}",
                header.feature.dtype
            )));
        }
        let [n, seq_len, mel_bins] = header.feature.shape;
        if header.filename.len() != n {
            return Err(StoreError::Corrupt(format!(
                "{} filenames for {} feature rows",
                header.filename.len(),
                n
            )));
        }
        if let Some(labels) = &header.emotion_label {
            if labels.len() != n {
                return Err(StoreError::Corrupt(format!(
                    "{} emotion labels for {} feature rows",
                    labels.len(),
                    n
                )));
            }
        }

        let data_len = n
            .checked_mul(seq_len)
            .and_then(|c| c.checked_mul(mel_bins))
            .and_then(|c| c.checked_mul(size_of::<f32>()))
            .ok_or_else(|| {
                StoreError::Corrupt(format!("feature shape {:?} overflows", header.feature.shape))
            })?;
        let available = body_len - header_len as u64;
        if data_len as u64 != available {
            return Err(StoreError::Corrupt(format!(
                "feature shape needs {data_len} bytes, file has {available}"
            )));
        }
        let mut raw = vec![0u8; data_len];
        reader.read_exact(&mut raw)?;
        let values: Vec<f32> = raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        let features = Array3::from_shape_vec((n, seq_len, mel_bins), values)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(Self {
            filenames: header.filename,
            features,
            emotion_labels: header.emotion_label,
        })
    }

    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }
}

/// Accumulates records of a fixed `(seq_len, mel_bins)` shape and writes them out.
#[derive(Debug)]
pub struct FeatureStoreWriter {
    seq_len: usize,
    mel_bins: usize,
    filenames: Vec<String>,
    labels: Vec<String>,
    labelled: Option<bool>,
    data: Vec<f32>,
}

impl FeatureStoreWriter {
    pub fn new(seq_len: usize, mel_bins: usize) -> Self {
        Self {
            seq_len,
            mel_bins,
            filenames: Vec::new(),
            labels: Vec::new(),
            labelled: None,
            data: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }

    /// Append one record. Every record must have exactly `(seq_len, mel_bins)` frames
    /// and either all or none of the records carry a label.
    pub fn push(
        &mut self,
        filename: &str,
        emotion_label: Option<&str>,
        frames: ArrayView2<'_, f32>,
    ) -> Result<(), StoreError> {
        let expected = (self.seq_len, self.mel_bins);
        if frames.dim() != expected {
            return Err(StoreError::ShapeMismatch {
                filename: filename.to_string(),
                expected,
                got: frames.dim(),
            });
        }

        let has_label = emotion_label.is_some();
        if *self.labelled.get_or_insert(has_label) != has_label {
            return Err(StoreError::MixedLabels(filename.to_string()));
        }

        self.filenames.push(filename.to_string());
        if let Some(label) = emotion_label {
            self.labels.push(label.to_string());
        }
        self.data.extend(frames.iter().copied());
        Ok(())
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let header = StoreHeader {
            filename: self.filenames.clone(),
            emotion_label: self.labelled.unwrap_or(false).then(|| self.labels.clone()),
            feature: TensorInfo {
                dtype: FEATURE_DTYPE.to_string(),
                shape: [self.filenames.len(), self.seq_len, self.mel_bins],
            },
        };
        let header_bytes = serde_json::to_vec(&header)?;

        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        writer.write_all(&(header_bytes.len() as u64).to_le_bytes())?;
        writer.write_all(&header_bytes)?;
        for v in &self.data {
            writer.write_all(&v.to_le_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }
}
