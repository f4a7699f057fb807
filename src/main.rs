use std::collections::BTreeMap;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use rayon::ThreadPoolBuilder;

use sticker_seg_rs::{Config, ImageProcessor};

fn main() -> Result<()> {
    let config = Config::parse();

    let log_level = if config.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    ensure!(config.input_dir.exists(), "Input directory does not exist");
    if let Some(model_path) = &config.model_path {
        ensure!(model_path.exists(), "Model path does not exist");
    }

    if let Some(num_threads) = config.num_threads {
        ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    tracing::info!(
        input = %config.input_dir.display(),
        output = %config.output_dir.display(),
        threshold = config.confidence_threshold,
        edge_smoothing = config.edge_smoothing,
        padding = config.padding,
        "starting sticker segmentation"
    );

    let processor = ImageProcessor::from_config(config).context("Invalid configuration")?;
    let outcomes = processor
        .process_directory()
        .context("Failed to process input directory")?;

    let mut tally: BTreeMap<String, usize> = BTreeMap::new();
    for (_, strategy) in &outcomes {
        *tally.entry(strategy.to_string()).or_default() += 1;
    }
    for (strategy, count) in tally {
        tracing::info!(%strategy, count, "tier summary");
    }

    Ok(())
}
