pub mod orchestrator;
mod types;

pub use orchestrator::{run_pipeline, run_stages};
pub use types::{PipelineEvent, RunOutcome, Stage};
