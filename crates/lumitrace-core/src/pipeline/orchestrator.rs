use tracing::info;

use crate::blob::{select_roi, BlobConfig, RoiSelection};
use crate::cluster::{cluster_pixels, GmmConfig};
use crate::correct::{subtract_reference, DarkImage};
use crate::error::{LumitraceError, Result};
use crate::features::FeatureMatrix;
use crate::frame::Stack;
use crate::io::tiff::{read_reference_image, read_stack_with};
use crate::signal::extract_signal;

use super::config::{AnalysisConfig, ReferenceKind};
use super::types::{NoOpReporter, PipelineStage, ProgressReporter};

/// Everything one analysis run produces.
#[derive(Clone, Debug)]
pub struct AnalysisOutput {
    /// Winning cluster, blob, and the derived square ROI.
    pub selection: RoiSelection,
    /// Per-frame intensity sums inside the ROI.
    pub signal: Vec<u64>,
    /// Number of frames analyzed.
    pub frames: usize,
}

/// Tag an error with the stage it came from. Each stage is wrapped exactly
/// once; inner calls return bare errors.
fn stage<T>(stage: PipelineStage, result: Result<T>) -> Result<T> {
    result.map_err(|e| LumitraceError::Stage {
        stage,
        source: Box::new(e),
    })
}

/// Run the full analysis: load, correct, cluster, select, extract.
///
/// Fail-fast: the first stage error aborts the run; nothing is retried and
/// no intermediate is written to disk.
pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisOutput> {
    run_analysis_reported(config, &NoOpReporter)
}

/// Same as [`run_analysis`], with progress callbacks.
pub fn run_analysis_reported(
    config: &AnalysisConfig,
    reporter: &dyn ProgressReporter,
) -> Result<AnalysisOutput> {
    let dark = match config.reference_kind {
        ReferenceKind::DarkMedian { frames } => {
            reporter.begin_stage(PipelineStage::LoadReference, Some(frames));
            let reference = stage(
                PipelineStage::LoadReference,
                read_stack_with(&config.reference, Some(frames), |n| reporter.advance(n)),
            )?;
            reporter.finish_stage();
            info!(
                path = %config.reference.display(),
                frames = reference.len(),
                "loaded reference stack"
            );

            reporter.begin_stage(PipelineStage::BuildDark, None);
            let dark = stage(
                PipelineStage::BuildDark,
                DarkImage::median_of_leading(&reference, frames),
            )?;
            reporter.finish_stage();
            dark
        }
        ReferenceKind::Background => {
            reporter.begin_stage(PipelineStage::LoadReference, None);
            let image = stage(
                PipelineStage::LoadReference,
                read_reference_image(&config.reference),
            )?;
            reporter.finish_stage();
            info!(path = %config.reference.display(), "loaded background image");
            DarkImage::from_image(image)
        }
    };

    reporter.begin_stage(PipelineStage::LoadRaw, None);
    let raw = stage(
        PipelineStage::LoadRaw,
        read_stack_with(&config.raw, None, |n| reporter.advance(n)),
    )?;
    reporter.finish_stage();
    info!(path = %config.raw.display(), frames = raw.len(), "loaded raw stack");

    reporter.begin_stage(PipelineStage::Correct, None);
    let corrected = stage(PipelineStage::Correct, subtract_reference(&raw, &dark))?;
    reporter.finish_stage();

    let selection = discover_roi_reported(&corrected, &config.clustering, &config.blob, reporter)?;
    info!(
        cluster = selection.cluster_id,
        size = selection.blob.size,
        roi = %selection.roi,
        "selected ROI"
    );

    reporter.begin_stage(PipelineStage::ExtractSignal, None);
    let signal = stage(
        PipelineStage::ExtractSignal,
        extract_signal(&corrected, &selection.roi),
    )?;
    reporter.finish_stage();

    Ok(AnalysisOutput {
        selection,
        signal,
        frames: corrected.len(),
    })
}

/// Cluster a corrected stack and pick the ROI, without extracting signal.
pub fn discover_roi(
    corrected: &Stack,
    clustering: &GmmConfig,
    blob: &BlobConfig,
) -> Result<RoiSelection> {
    discover_roi_reported(corrected, clustering, blob, &NoOpReporter)
}

fn discover_roi_reported(
    corrected: &Stack,
    clustering: &GmmConfig,
    blob: &BlobConfig,
    reporter: &dyn ProgressReporter,
) -> Result<RoiSelection> {
    reporter.begin_stage(PipelineStage::BuildFeatures, None);
    let features = FeatureMatrix::from_stack(corrected);
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Cluster, None);
    let assignment = stage(PipelineStage::Cluster, cluster_pixels(&features, clustering))?;
    reporter.finish_stage();
    info!(
        pixels = assignment.len(),
        clusters = assignment.n_clusters(),
        "clustered pixel traces"
    );

    reporter.begin_stage(PipelineStage::SelectRoi, None);
    let selection = stage(
        PipelineStage::SelectRoi,
        select_roi(&assignment, corrected.dims(), blob),
    )?;
    reporter.finish_stage();
    Ok(selection)
}
