use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use lumitrace_core::correct::DarkImage;
use lumitrace_core::io::tiff::{probe, read_stack_with, write_image_f32};

#[derive(Args)]
pub struct DarkArgs {
    /// Reference dark stack (TIFF)
    pub file: PathBuf,

    /// Number of leading frames to fold into the median
    #[arg(long, default_value = "100")]
    pub frames: usize,

    /// Output dark image path (32-bit float TIFF)
    #[arg(short, long, default_value = "dark.tiff")]
    pub output: PathBuf,
}

pub fn run(args: &DarkArgs) -> Result<()> {
    let info = probe(&args.file)?;
    let to_read = args.frames.min(info.frames);

    let pb = ProgressBar::new(to_read as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("Reading  [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    let stack = read_stack_with(&args.file, Some(args.frames), |n| pb.set_position(n as u64))?;
    pb.finish_and_clear();

    let dark = DarkImage::median_of_leading(&stack, args.frames)?;
    write_image_f32(&args.output, dark.data())
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Dark image ({}-frame median, {}x{}) saved to {}",
        args.frames,
        info.width,
        info.height,
        args.output.display()
    );

    Ok(())
}
