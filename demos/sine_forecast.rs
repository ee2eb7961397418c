use lstm_timeseries::persistence::{ModelMetadata, PersistentModel};
use lstm_timeseries::{Experiment, ForecastConfig, Subset};
use std::env;
use std::error::Error;
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Trains the forecaster on sin(x) and reports the error of every split.
///
/// Usage: `cargo run --example sine_forecast [config.json] [report.json]`
fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = env::args().skip(1);
    let config = match args.next() {
        Some(path) => ForecastConfig::from_json_file(&path)?,
        None => ForecastConfig::default(),
    };
    let report_path = args.next();

    let experiment = Experiment::new(config)?;
    let mut trainer = experiment.build_trainer()?;
    let report = experiment.run_with(&mut trainer)?;

    println!("\nSine forecast, {} epochs", report.loss_summary.len());
    println!("{:<6} {:>8} {:>12}", "split", "rows", "mse");
    for subset in Subset::ALL {
        if let Some(result) = report.subset(subset) {
            println!("{:<6} {:>8} {:>12.6}", subset, result.rows, result.error);
        }
    }

    if let Some(test) = report.subset(Subset::Test) {
        println!("\nFirst test predictions:");
        for (prediction, label) in test.predictions.iter().zip(test.labels.iter()).take(5) {
            println!("  predicted {:>8.4}  actual {:>8.4}", prediction, label);
        }
    }

    if let Some(path) = report_path {
        fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        info!(path = %path, "report written");

        let data = &experiment.config().data;
        let metadata = ModelMetadata::for_model(
            &trainer.model,
            "sine_forecast".to_string(),
            data.time_steps,
            data.time_shift,
            report.loss_summary.len(),
            report.loss_summary.last().copied(),
            Some("LSTM forecaster trained on sin(x)".to_string()),
        );
        let model_path = format!("{}.model.json", path.trim_end_matches(".json"));
        trainer.model.save(&model_path, metadata)?;
        info!(path = %model_path, "model saved");
    }

    Ok(())
}
