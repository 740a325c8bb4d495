use std::time::Instant;

use tracing::{debug, warn};

use crate::console::Console;

use super::types::{PipelineEvent, RunOutcome, Stage};

/// Run the stages in order, printing progress to `console`.
///
/// Stops at the first stage whose check fails; later stages never run.
pub fn run_pipeline(stages: &[Stage], console: &Console) -> RunOutcome {
    run_stages(stages, |event| {
        log_event(&event);
        if let Some(msg) = event.message() {
            console.line(msg);
        }
    })
}

/// Run the stages in order, handing every event to `emit`.
///
/// The final event is always either `Completed` or `Stopped`.
pub fn run_stages(stages: &[Stage], mut emit: impl FnMut(PipelineEvent)) -> RunOutcome {
    for stage in stages {
        let name = stage.name().to_string();
        emit(PipelineEvent::StageStarted(name.clone()));

        let start = Instant::now();
        let passed = stage.run();
        emit(PipelineEvent::StageFinished {
            stage: name.clone(),
            passed,
            elapsed: start.elapsed(),
        });

        if !passed {
            emit(PipelineEvent::Stopped(name.clone()));
            return RunOutcome::Stopped { stage: name };
        }
    }

    emit(PipelineEvent::Completed);
    RunOutcome::Completed
}

fn log_event(event: &PipelineEvent) {
    match event {
        PipelineEvent::StageStarted(stage) => debug!(stage = %stage, "stage started"),
        PipelineEvent::StageFinished {
            stage,
            passed,
            elapsed,
        } => debug!(stage = %stage, passed, ?elapsed, "stage finished"),
        PipelineEvent::Stopped(stage) => warn!(stage = %stage, "pipeline stopped"),
        PipelineEvent::Completed => debug!("pipeline completed"),
    }
}
