/// Analysis stage, used for progress reporting and error context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    LoadReference,
    BuildDark,
    LoadRaw,
    Correct,
    BuildFeatures,
    Cluster,
    SelectRoi,
    ExtractSignal,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoadReference => write!(f, "Loading reference"),
            Self::BuildDark => write!(f, "Building dark image"),
            Self::LoadRaw => write!(f, "Loading raw stack"),
            Self::Correct => write!(f, "Subtracting reference"),
            Self::BuildFeatures => write!(f, "Building pixel traces"),
            Self::Cluster => write!(f, "Clustering pixels"),
            Self::SelectRoi => write!(f, "Selecting ROI"),
            Self::ExtractSignal => write!(f, "Extracting signal"),
        }
    }
}

/// Progress callbacks for the analysis run.
///
/// Implementors can drive progress bars or any other UI feedback. All
/// methods have default no-op implementations.
pub trait ProgressReporter {
    /// A new stage has started. `total_items` is the number of work items
    /// in this stage (e.g., frame count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_analysis` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
