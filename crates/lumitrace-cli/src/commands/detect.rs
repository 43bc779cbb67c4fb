use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use lumitrace_core::blob::BlobConfig;
use lumitrace_core::cluster::GmmConfig;
use lumitrace_core::correct::{subtract_reference, DarkImage};
use lumitrace_core::io::tiff::{read_reference_image, read_stack};
use lumitrace_core::pipeline::discover_roi;

#[derive(Args)]
pub struct DetectArgs {
    /// Raw acquisition stack (TIFF)
    pub file: PathBuf,

    /// Reference dark stack or background image (TIFF)
    #[arg(long)]
    pub reference: PathBuf,

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
}

pub fn run(args: &DetectArgs) -> Result<()> {
    let dark = if args.background {
        DarkImage::from_image(read_reference_image(&args.reference)?)
    } else {
        let reference = read_stack(&args.reference, Some(args.dark_frames))?;
        DarkImage::median_of_leading(&reference, args.dark_frames)?
    };

    let raw = read_stack(&args.file, None)?;
    let corrected = subtract_reference(&raw, &dark)?;

    let clustering = GmmConfig {
        n_clusters: args.clusters,
        seed: args.seed,
        ..GmmConfig::default()
    };
    let blob = BlobConfig {
        min_area: args.min_area,
        ..BlobConfig::default()
    };

    let selection = discover_roi(&corrected, &clustering, &blob)?;

    let (min_row, max_row, min_col, max_col) = selection.blob.bbox;
    println!("Cluster:   {}", selection.cluster_id);
    println!(
        "Blob:      size {:.2}, area {} px",
        selection.blob.size, selection.blob.area
    );
    println!(
        "Centroid:  ({:.2}, {:.2})",
        selection.blob.cx, selection.blob.cy
    );
    println!(
        "Bbox:      rows {}..={}, cols {}..={}",
        min_row, max_row, min_col, max_col
    );
    println!("ROI:       {}", selection.roi);

    Ok(())
}
