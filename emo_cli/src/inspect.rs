use anyhow::Result;
use clap::Args;
use ndarray::Array3;
use std::path::PathBuf;

use emo_train::{
    BatchGenerator, Dataset, DevelopmentSplit, SplitKind, TestBatchGenerator, TestDataset,
    DEFAULT_SEED,
};

use crate::settings::Settings;

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Development feature store
    #[arg(long)]
    pub dev_store: PathBuf,

    /// Train manifest (default: the whole development store)
    #[arg(long)]
    pub train_manifest: Option<PathBuf>,

    /// Validation manifest (default: the whole development store)
    #[arg(long)]
    pub validate_manifest: Option<PathBuf>,

    /// Separate test feature store, scaled with the development statistics
    #[arg(long)]
    pub test_store: Option<PathBuf>,

    /// Split to evaluate: train | validate
    #[arg(long, default_value = "validate")]
    pub data_type: String,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Train batches to pull
    #[arg(long, default_value_t = 3)]
    pub train_pulls: usize,

    #[arg(long)]
    pub shuffle: bool,

    #[arg(long)]
    pub max_iteration: Option<usize>,
}

pub fn run(args: InspectArgs, settings: &Settings) -> Result<()> {
    let kind: SplitKind = args.data_type.parse()?;
    let dataset = Dataset::load(&args.dev_store, settings.vocabulary()?)?;
    let split = DevelopmentSplit::from_manifest_files(
        &dataset,
        args.train_manifest.as_deref(),
        args.validate_manifest.as_deref(),
    )?;

    for k in [SplitKind::Train, SplitKind::Validate] {
        println!(
            "{k}: {} audios ({} manifest rows dropped)",
            split.indices(k).len(),
            split.dropped(k)
        );
    }
    let stats = split.stats();
    println!("scalar: mean={} std={}", stats.mean, stats.std);

    let generator = BatchGenerator::new(&dataset, &split, args.batch_size)?.with_seed(args.seed);

    for (i, batch) in generator.train().take(args.train_pulls).enumerate() {
        println!("train pull {i}: {}", summarize(&batch.features));
    }

    for (i, batch) in generator
        .validate(kind, args.shuffle, args.max_iteration)
        .enumerate()
    {
        println!("{kind} batch {i}: {}", summarize(&batch.features));
    }

    if let Some(test_store) = &args.test_store {
        let test = TestDataset::load(test_store)?;
        let test_generator = TestBatchGenerator::new(&test, &split, args.batch_size)?;
        for (i, batch) in test_generator.batches().enumerate() {
            println!(
                "test batch {i}: {} (first: {})",
                summarize(&batch.features),
                batch.filenames.first().map(String::as_str).unwrap_or("-")
            );
        }
    }

    Ok(())
}

fn summarize(features: &Array3<f32>) -> String {
    let min = features.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = features.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let nan_count = features.iter().filter(|x| x.is_nan()).count();
    format!(
        "{} items, min={min}, max={max}, nan_count={nan_count}",
        features.len_of(ndarray::Axis(0))
    )
}
