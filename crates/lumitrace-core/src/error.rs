use thiserror::Error;

use crate::frame::Roi;
use crate::pipeline::PipelineStage;

#[derive(Error, Debug)]
pub enum LumitraceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Unsupported TIFF layout: {0}")]
    UnsupportedFormat(String),

    #[error("Empty stack: no frames decoded")]
    EmptyStack,

    #[error("Shape mismatch: expected {expected_width}x{expected_height}, got {actual_width}x{actual_height}")]
    ShapeMismatch {
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },

    #[error("Not enough frames for dark image: requested {requested}, stack has {available}")]
    InsufficientFrames { requested: usize, available: usize },

    #[error("Mixture fit did not converge within {iterations} iterations")]
    Convergence { iterations: usize },

    #[error("No blob above the minimum area in any of {clusters} cluster masks")]
    NoProminentBlob { clusters: usize },

    #[error("ROI {roi} exceeds frame bounds {width}x{height}")]
    RoiOutOfBounds {
        roi: Roi,
        width: usize,
        height: usize,
    },

    #[error("Invalid parameter: {0}")]
    Config(String),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: PipelineStage,
        #[source]
        source: Box<LumitraceError>,
    },
}

pub type Result<T> = std::result::Result<T, LumitraceError>;
