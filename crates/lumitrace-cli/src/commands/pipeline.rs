use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use lumitrace_core::blob::BlobConfig;
use lumitrace_core::cluster::GmmConfig;
use lumitrace_core::pipeline::{
    run_analysis_reported, AnalysisConfig, AnalysisOutput, PipelineStage, ProgressReporter,
    ReferenceKind,
};

use crate::summary::print_analysis_summary;

#[derive(Args)]
pub struct RunArgs {
    /// Raw acquisition stack (TIFF)
    #[arg(required_unless_present = "config")]
    pub file: Option<PathBuf>,

    /// Reference dark stack or background image (TIFF)
    #[arg(long, required_unless_present = "config")]
    pub reference: Option<PathBuf>,

    /// Analysis config file (TOML); overrides the other flags
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Treat the reference as a single background image
    #[arg(long)]
    pub background: bool,

    /// Leading reference frames for the dark median
    #[arg(long, default_value = "100")]
    pub dark_frames: usize,

    /// Number of mixture components
    #[arg(long, default_value = "5")]
    pub clusters: usize,

    /// Minimum blob area in pixels
    #[arg(long, default_value = "50")]
    pub min_area: f64,

    /// RNG seed for the mixture fit
    #[arg(long, default_value = "0")]
    pub seed: u64,

    /// Output CSV path; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid analysis config")?
    } else {
        build_config_from_args(args)?
    };

    print_analysis_summary(&config);

    let reporter = ConsoleReporter::new()?;
    let output = run_analysis_reported(&config, &reporter)?;
    reporter.finish();

    write_signal(&output, args.output.as_deref())?;

    let selection = &output.selection;
    println!();
    println!(
        "Cluster {}  blob size {:.2} ({} px)  ROI {}",
        selection.cluster_id, selection.blob.size, selection.blob.area, selection.roi
    );
    if let Some(ref path) = args.output {
        println!("Signal ({} frames) saved to {}", output.frames, path.display());
    }

    Ok(())
}

fn build_config_from_args(args: &RunArgs) -> Result<AnalysisConfig> {
    // required_unless_present guarantees both paths when --config is absent
    let raw = args.file.clone().context("missing raw stack path")?;
    let reference = args.reference.clone().context("missing --reference")?;
    let reference_kind = if args.background {
        ReferenceKind::Background
    } else {
        ReferenceKind::DarkMedian {
            frames: args.dark_frames,
        }
    };
    Ok(AnalysisConfig {
        raw,
        reference,
        reference_kind,
        clustering: GmmConfig {
            n_clusters: args.clusters,
            seed: args.seed,
            ..GmmConfig::default()
        },
        blob: BlobConfig {
            min_area: args.min_area,
            ..BlobConfig::default()
        },
    })
}

fn write_signal(output: &AnalysisOutput, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let mut writer = csv::Writer::from_path(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_rows(&mut writer, &output.signal)
        }
        None => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            write_rows(&mut writer, &output.signal)
        }
    }
}

fn write_rows<W: std::io::Write>(writer: &mut csv::Writer<W>, signal: &[u64]) -> Result<()> {
    writer.write_record(["frame", "sum"])?;
    for (frame, sum) in signal.iter().enumerate() {
        writer.write_record([frame.to_string(), sum.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

struct ConsoleReporter {
    bar: ProgressBar,
}

impl ConsoleReporter {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
        Ok(ConsoleReporter { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for ConsoleReporter {
    fn begin_stage(&self, stage: PipelineStage, _total_items: Option<usize>) {
        self.bar.set_message(stage.to_string());
        self.bar.tick();
    }

    fn advance(&self, _items_done: usize) {
        self.bar.tick();
    }
}
