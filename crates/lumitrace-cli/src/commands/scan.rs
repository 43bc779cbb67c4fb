use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use lumitrace_core::io::tiff::probe;
use tracing::warn;

#[derive(Args)]
pub struct ScanArgs {
    /// Directory to scan for TIFF files
    pub dir: PathBuf,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,
}

pub fn run(args: &ScanArgs) -> Result<()> {
    let mut files = Vec::new();
    collect_tiffs(&args.dir, args.recursive, &mut files)?;
    files.sort();

    if files.is_empty() {
        println!("No TIFF files under {}", args.dir.display());
        return Ok(());
    }

    for path in &files {
        match probe(path) {
            Ok(info) => println!(
                "{:>5} frame(s)  {:>5}x{:<5} {:>2}-bit  {}",
                info.frames,
                info.width,
                info.height,
                info.bit_depth,
                path.display()
            ),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable file");
                println!("    unreadable              {}", path.display());
            }
        }
    }
    println!("\n{} file(s)", files.len());

    Ok(())
}

fn collect_tiffs(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if recursive {
                collect_tiffs(&path, recursive, out)?;
            }
            continue;
        }
        let is_tiff = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
            .unwrap_or(false);
        if is_tiff {
            out.push(path);
        }
    }
    Ok(())
}
