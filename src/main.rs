use anyhow::{Context, Result};
use log::info;

mod calc;
mod config;
mod data;
mod error;
mod util;

use crate::calc::incremental_update::{IncrementalUpdater, UpdateOutcome};
use crate::config::Config;
use crate::data::dataset::TIMESTAMP_FORMAT;
use crate::data::store::{write_report, CsvStore};
use crate::error::VolatilityError;


fn main() -> Result<()> {
    // Load the configuration from the environment and .env file
    let config = Config::from_env().context("Invalid configuration")?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!(
        "Updating volatility in {} (window = {} samples, frequency = {})",
        config.data_dir.display(),
        config.window.samples(),
        config.frequency
    );

    let store = CsvStore::new(&config.data_dir);
    let mut updater = IncrementalUpdater::new(
        store,
        config.dataset_file.clone(),
        config.window,
        config.frequency,
    );

    let update = match updater.run() {
        Ok(update) => update,
        Err(VolatilityError::MissingInput { dir }) => {
            // Nothing to do without 1 minute prices, and nothing was written
            println!(
                "You need to input 1 minute closing price data in {} to run this algorithm",
                dir.display()
            );
            return Ok(());
        }
        Err(e) => return Err(e).context("Volatility update failed"),
    };

    match update.outcome {
        UpdateOutcome::FullRecompute { computed } => {
            println!("Volatility calculated from scratch for {} minutes", computed)
        }
        UpdateOutcome::PartialUpdate { boundary, filled } => println!(
            "Volatility updated from position {}, {} new values",
            boundary, filled
        ),
        UpdateOutcome::UpToDate => println!("Volatility already up to date"),
    }

    info!(
        "{} minutes in the dataset ({} appended, {}), {} report buckets",
        update.dataset.len(),
        update.appended,
        if update.written { "rewritten" } else { "unchanged" },
        update.report.len()
    );

    if update.report.is_empty() {
        println!("No volatility to report yet");
    }

    // Print the reporting series
    for bucket in &update.report.buckets {
        match bucket.volatility {
            Some(volatility) => println!(
                "{}: {:.6}",
                bucket.start.format(TIMESTAMP_FORMAT),
                volatility
            ),
            None => println!("{}: -", bucket.start.format(TIMESTAMP_FORMAT)),
        }
    }

    if let Some(path) = &config.report_file {
        write_report(path, &update.report)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    Ok(())
}
