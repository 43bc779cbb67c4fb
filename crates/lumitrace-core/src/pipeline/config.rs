use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::blob::BlobConfig;
use crate::cluster::GmmConfig;
use crate::consts::DEFAULT_DARK_FRAME_COUNT;

/// How the reference file should be interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// Per-pixel median over the first `frames` frames of a dark stack.
    DarkMedian { frames: usize },
    /// A single pre-built background or dark image, used as-is.
    Background,
}

impl Default for ReferenceKind {
    fn default() -> Self {
        ReferenceKind::DarkMedian {
            frames: DEFAULT_DARK_FRAME_COUNT,
        }
    }
}

/// Full configuration for one analysis run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Raw acquisition stack: single- or multi-page grayscale TIFF.
    pub raw: PathBuf,
    /// Reference file; interpretation depends on `reference_kind`.
    pub reference: PathBuf,
    /// Reference interpretation.
    #[serde(default)]
    pub reference_kind: ReferenceKind,
    /// Pixel-trace clustering parameters.
    #[serde(default)]
    pub clustering: GmmConfig,
    /// Blob detection and ROI selection parameters.
    #[serde(default)]
    pub blob: BlobConfig,
}
