use std::fmt;
use std::time::Duration;

/// A named check in the pipeline.
///
/// The check takes no input and reports pass (`true`) or fail (`false`).
/// Anything it needs (config, console) is captured when the stage is built.
pub struct Stage {
    name: String,
    check: Box<dyn Fn() -> bool>,
}

impl Stage {
    pub fn new(name: impl Into<String>, check: impl Fn() -> bool + 'static) -> Self {
        Self {
            name: name.into(),
            check: Box::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run(&self) -> bool {
        (self.check)()
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage").field("name", &self.name).finish()
    }
}

/// Events emitted by the pipeline runner, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    StageStarted(String),
    StageFinished {
        stage: String,
        passed: bool,
        elapsed: Duration,
    },
    Stopped(String),
    Completed,
}

impl PipelineEvent {
    /// The progress line printed for this event, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            PipelineEvent::StageStarted(stage) => Some(format!("Starting stage: {stage}")),
            PipelineEvent::StageFinished { .. } => None,
            PipelineEvent::Stopped(stage) => Some(format!("Pipeline stopped at stage: {stage}")),
            PipelineEvent::Completed => Some("Pipeline completed successfully!".to_string()),
        }
    }
}

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Stopped { stage: String },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_runs_its_check() {
        let pass = Stage::new("pass", || true);
        let fail = Stage::new("fail", || false);
        assert!(pass.run());
        assert!(!fail.run());
        assert_eq!(pass.name(), "pass");
    }

    #[test]
    fn stage_debug_shows_name_only() {
        let stage = Stage::new("Dependency Checking", || true);
        assert_eq!(format!("{stage:?}"), r#"Stage { name: "Dependency Checking" }"#);
    }

    #[test]
    fn event_messages() {
        assert_eq!(
            PipelineEvent::StageStarted("Lint".into()).message().as_deref(),
            Some("Starting stage: Lint")
        );
        assert_eq!(
            PipelineEvent::Stopped("Lint".into()).message().as_deref(),
            Some("Pipeline stopped at stage: Lint")
        );
        assert_eq!(
            PipelineEvent::Completed.message().as_deref(),
            Some("Pipeline completed successfully!")
        );
        let finished = PipelineEvent::StageFinished {
            stage: "Lint".into(),
            passed: true,
            elapsed: Duration::ZERO,
        };
        assert!(finished.message().is_none());
    }

    #[test]
    fn outcome_success() {
        assert!(RunOutcome::Completed.is_success());
        assert!(
            !RunOutcome::Stopped {
                stage: "Lint".into()
            }
            .is_success()
        );
    }
}
