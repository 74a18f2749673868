// core/src/flow/control.rs

/// Signal returned by a step handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
  /// Run the remaining handlers and steps.
  Continue,
  /// Halt the flow. Nothing after this handler runs.
  Stop,
}

/// How a flow run ended when no handler failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
  /// Every step that was not skipped ran to completion.
  Completed,
  /// A handler returned [`FlowControl::Stop`] while running `step`.
  Stopped { step: String },
}

impl FlowOutcome {
  pub fn stopped_at(&self, step: &str) -> bool {
    matches!(self, FlowOutcome::Stopped { step: s } if s == step)
  }
}
