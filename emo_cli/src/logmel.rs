use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use emo_core::{decode_to_mono, repeat_to_length, ExtractionConfig, FeatureStoreWriter, LogMelExtractor};
use emo_tools::{read_meta, MetaEntry};

use crate::settings::Settings;

const MINI_DATA_SIZE: usize = 10;
const MINI_DATA_SEED: u64 = 1234;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DataType {
    Development,
    Test,
}

impl DataType {
    fn name(self) -> &'static str {
        match self {
            DataType::Development => "development",
            DataType::Test => "test",
        }
    }
}

#[derive(Debug, Args)]
pub struct LogmelArgs {
    /// Directory holding the audio files named in the meta CSV
    #[arg(long)]
    pub dataset_dir: PathBuf,

    /// Output root; the store goes to <workspace>/features/logmel/<data-type>.feat
    #[arg(long)]
    pub workspace: PathBuf,

    #[arg(long, value_enum, default_value_t = DataType::Development)]
    pub data_type: DataType,

    /// Meta CSV (default: <dataset-dir>/meta.csv)
    #[arg(long)]
    pub meta_csv: Option<PathBuf>,

    /// Only extract a small random subset
    #[arg(long)]
    pub mini_data: bool,
}

pub fn run(args: LogmelArgs, settings: &Settings) -> Result<()> {
    let cfg = &settings.extraction;
    let extractor = LogMelExtractor::new(cfg)?;

    let meta_csv = args
        .meta_csv
        .clone()
        .unwrap_or_else(|| args.dataset_dir.join("meta.csv"));
    let mut entries = read_meta(&meta_csv)?;

    if args.mini_data {
        entries.shuffle(&mut StdRng::seed_from_u64(MINI_DATA_SEED));
        entries.truncate(MINI_DATA_SIZE);
    }

    if args.data_type == DataType::Development {
        if let Some(entry) = entries.iter().find(|e| e.emotion_label.is_none()) {
            bail!(
                "{} has no emotion label in {}",
                entry.filename,
                meta_csv.display()
            );
        }
    }

    info!(audios = entries.len(), data_type = args.data_type.name(), "extracting log-mel features");

    let store_path = args
        .workspace
        .join("features")
        .join("logmel")
        .join(format!("{}.feat", args.data_type.name()));
    if let Some(parent) = store_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let calculate_time = Instant::now();

    let features = entries
        .par_iter()
        .map(|entry| extract_one(&extractor, cfg, &args.dataset_dir.join(&entry.filename)))
        .collect::<Result<Vec<Array2<f32>>>>()?;

    let mut writer = FeatureStoreWriter::new(cfg.seq_len, cfg.mel_bins);
    for (entry, frames) in entries.iter().zip(&features) {
        writer
            .push(&entry.filename, store_label(entry, args.data_type), frames.view())
            .with_context(|| format!("cannot store features of {}", entry.filename))?;
    }
    writer.write(&store_path)?;

    info!(
        path = %store_path.display(),
        records = writer.len(),
        elapsed_s = calculate_time.elapsed().as_secs_f64(),
        "wrote feature store"
    );
    Ok(())
}

fn store_label(entry: &MetaEntry, data_type: DataType) -> Option<&str> {
    match data_type {
        DataType::Development => entry.emotion_label.as_deref(),
        DataType::Test => None,
    }
}

fn extract_one(extractor: &LogMelExtractor, cfg: &ExtractionConfig, path: &Path) -> Result<Array2<f32>> {
    let audio = decode_to_mono(path, cfg.sample_rate)?;
    let frames = extractor
        .transform(&audio)
        .with_context(|| format!("failed to extract {}", path.display()))?;
    debug!(path = %path.display(), frames = frames.nrows(), "extracted");
    Ok(repeat_to_length(&frames, cfg.seq_len)?)
}
