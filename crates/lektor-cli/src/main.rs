//! Lektor CLI - OCR pipeline over a scan directory
//!
//! Runs the configured steps (tesseract, replacements, postprocessing,
//! quality estimation) for every image and writes the `.wtr` report.

use anyhow::{Context as _, Result, bail};
use clap::Parser;
use lektor::{Pipeline, PipelineConfig, PipelineOverrides};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "lektor",
    version,
    about = "OCR pipeline with lexical quality estimation",
    after_help = "EXAMPLES:\n  \
                  lektor /data/scans/1981185920_44046\n  \
                  lektor -c pipeline.toml -e 8 -m frk+deu -x \"--dpi 470\" /data/scans/1981185920_44046"
)]
struct Cli {
    /// Path to the scan data directory
    scandata: PathBuf,

    /// Iterate recursively from the scan data path top-down
    #[arg(short, long)]
    recursive: bool,

    /// Path to the config file, `lektor.toml` is searched if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the workdir
    #[arg(short, long)]
    workdir: Option<PathBuf>,

    /// Number of documents processed concurrently
    #[arg(short, long)]
    executors: Option<usize>,

    /// Tesseract model configuration, e.g. `frk+deu`
    #[arg(short, long = "models")]
    models: Option<String>,

    /// Arguments passed to tesseract as they are, e.g. "--dpi 470 --psm 4"
    #[arg(short = 'x', long, num_args = 1.., allow_hyphen_values = true)]
    extra: Vec<String>,

    /// Tesseract binary
    #[arg(long)]
    tesseract_bin: Option<String>,

    /// Log filter, `RUST_LOG` takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn overrides(&self) -> PipelineOverrides {
        PipelineOverrides {
            workdir: self.workdir.clone(),
            executors: self.executors,
            model_configs: self.models.clone(),
            extra: self.extra.clone(),
            tesseract_bin: self.tesseract_bin.clone(),
            recursive: self.recursive.then_some(true),
        }
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => {
            PipelineConfig::from_file(path).with_context(|| format!("Failed to load config '{}'", path.display()))
        }
        None => PipelineConfig::discover()?.context("No config given and no lektor.toml found"),
    }
}

async fn run(pipeline: &Pipeline) -> lektor::Result<()> {
    if let Some(workdir) = pipeline.prepare_workdir()? {
        tracing::info!("workdir '{}'", workdir.display());
    }
    let paths = pipeline.input_paths()?;
    let records = pipeline.run(paths).await?;
    tracing::debug!("having '{}' workflow results", records.len());
    pipeline.store_estimations(&records)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if !cli.scandata.is_dir() {
        bail!("scandata path '{}' invalid", cli.scandata.display());
    }

    let mut config = load_config(cli.config.as_deref())?;
    config.apply(&cli.overrides());
    let pipeline = Pipeline::new(&cli.scandata, config).context("Invalid pipeline configuration")?;

    let started = Instant::now();
    if let Err(e) = run(&pipeline).await {
        tracing::error!("pipeline failed: {}", e);
        pipeline.mark_fail()?;
        return Err(e.into());
    }
    pipeline.mark_done()?;

    let elapsed = started.elapsed().as_secs_f64();
    tracing::info!(
        "Pipeline finished ({:.2} sec, {}min {}sec)",
        elapsed,
        (elapsed / 60.0).floor(),
        (elapsed % 60.0).floor()
    );
    Ok(())
}
