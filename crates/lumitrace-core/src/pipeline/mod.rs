pub mod config;
mod orchestrator;
mod types;

pub use config::{AnalysisConfig, ReferenceKind};
pub use orchestrator::{discover_roi, run_analysis, run_analysis_reported, AnalysisOutput};
pub use types::{PipelineStage, ProgressReporter};
