mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumitrace", about = "Bioluminescence ROI discovery and signal extraction")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show TIFF stack metadata
    Info(commands::info::InfoArgs),
    /// List TIFF stacks under a directory
    Scan(commands::scan::ScanArgs),
    /// Build a dark image from a reference stack and save it
    Dark(commands::dark::DarkArgs),
    /// Discover the ROI without extracting signal
    Detect(commands::detect::DetectArgs),
    /// Run the full analysis and write the signal series
    Run(commands::pipeline::RunArgs),
    /// Print or save a default analysis config
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Scan(args) => commands::scan::run(args),
        Commands::Dark(args) => commands::dark::run(args),
        Commands::Detect(args) => commands::detect::run(args),
        Commands::Run(args) => commands::pipeline::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
