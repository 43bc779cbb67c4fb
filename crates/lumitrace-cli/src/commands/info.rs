use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use lumitrace_core::io::tiff::probe;

#[derive(Args)]
pub struct InfoArgs {
    /// Input TIFF stack
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let info = probe(&args.file)?;

    println!("File:        {}", args.file.display());
    println!("Frames:      {}", info.frames);
    println!("Dimensions:  {}x{}", info.width, info.height);
    println!("Bit depth:   {}", info.bit_depth);

    let frame_bytes =
        info.width as usize * info.height as usize * (info.bit_depth as usize).div_ceil(8);
    let total_mb = (frame_bytes * info.frames) as f64 / (1024.0 * 1024.0);
    println!("Data size:   {:.1} MB", total_mb);

    Ok(())
}
