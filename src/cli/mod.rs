//! Command-line interface for training and prediction.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::export::ArtifactStore;
use crate::inference::Predictor;
use crate::pipeline::SurvivalPipeline;
use crate::training::ModelVariant;
use crate::utils::{DataLoader, DataSaver};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) {
    println!("  {:<16} {}", muted(key), val.white());
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

#[derive(Parser)]
#[command(name = "titanic-survival")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and compare survival classifiers on a passenger manifest")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split, fit features, train every variant and compare them
    Train {
        /// Labeled manifest CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Directory for artifacts and the comparison table
        #[arg(short, long)]
        output: PathBuf,

        /// Pipeline configuration JSON
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the split and model seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Predict survival for a manifest with a saved artifact
    Predict {
        /// Directory written by `train`
        #[arg(short, long)]
        artifacts: PathBuf,

        /// Variant to use (logistic, forest, boosted); best ranked when omitted
        #[arg(short, long)]
        variant: Option<String>,

        /// Manifest CSV to score
        #[arg(short, long)]
        data: PathBuf,

        /// Output predictions CSV
        #[arg(short, long)]
        output: PathBuf,
    },
}

pub fn cmd_train(
    data_path: &Path,
    output: &Path,
    config_path: Option<&Path>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    section("Train");

    let mut config = match config_path {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }

    step_run("Loading data");
    let start = Instant::now();
    let records = DataLoader::new().load_passengers(data_path)?;
    step_done(&format!("{} records in {:?}", records.len(), start.elapsed()));

    step_run("Training variants");
    let start = Instant::now();
    let run = SurvivalPipeline::new(config).run(&records)?;
    step_done(&format!("{:?}", start.elapsed()));

    let store = ArtifactStore::open(output)?;
    store.save_run(&run)?;

    println!();
    kv("Train records", &run.partition.train.len().to_string());
    kv("Eval records", &run.partition.eval.len().to_string());
    kv("Artifacts", &store.root().display().to_string());
    println!();
    for line in run.report().lines() {
        println!("  {}", line);
    }
    println!();

    Ok(())
}

pub fn cmd_predict(
    artifacts: &Path,
    variant: Option<&str>,
    data_path: &Path,
    output: &Path,
) -> anyhow::Result<()> {
    section("Predict");

    let store = ArtifactStore::open(artifacts)?;
    let variant = match variant {
        Some(v) => v.parse::<ModelVariant>()?,
        None => store
            .load_comparison()?
            .best()
            .map(|row| row.report.variant)
            .ok_or_else(|| anyhow::anyhow!("no trained variant in {}", artifacts.display()))?,
    };

    step_run(&format!("Scoring with {}", variant.to_string().cyan()));
    let start = Instant::now();
    let predictor = Predictor::from_store(&store, variant)?;
    let records = DataLoader::new().load_passengers(data_path)?;
    let predictions = predictor.predict(&records)?;
    DataSaver::save_predictions(&predictions, output)?;
    step_done(&format!("{:?}", start.elapsed()));

    let survivors = predictions.iter().filter(|p| p.survived).count();
    println!();
    kv("Records", &predictions.len().to_string());
    kv("Survivors", &survivors.to_string());
    kv("Output", &output.display().to_string());
    println!();

    Ok(())
}
