// core/src/flow/execution.rs

//! `Flow::run()`: walks the steps and drives their before/on/after handlers.

use super::context_data::ContextData;
use super::control::{FlowControl, FlowOutcome};
use super::definition::{Flow, Handler};
use super::step::StepDef;
use crate::error::FlowError;
use tracing::{event, instrument, span, Instrument, Level};

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// A failing handler aborts the run with its error unless the step is
  /// optional, in which case the failure is logged and the next step runs.
  #[instrument(
    name = "Flow::run",
    skip_all,
    fields(flow = self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<FlowOutcome, Err> {
    event!(Level::DEBUG, "Flow execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_span = span!(
        Level::INFO,
        "flow_step",
        step = step_def.name.as_str(),
        step_index = step_idx,
        optional = step_def.optional
      );

      match self.run_step(step_def, &ctx_data).instrument(step_span).await {
        Ok(FlowControl::Continue) => {}
        Ok(FlowControl::Stop) => {
          event!(Level::INFO, step = %step_def.name, "Flow stopped by a handler.");
          return Ok(FlowOutcome::Stopped {
            step: step_def.name.clone(),
          });
        }
        Err(e) if step_def.optional => {
          event!(Level::WARN, step = %step_def.name, error = %e, "Optional step failed; continuing.");
        }
        Err(e) => {
          event!(Level::ERROR, step = %step_def.name, error = %e, "Step failed.");
          return Err(e);
        }
      }
    }

    event!(Level::DEBUG, "Flow execution completed.");
    Ok(FlowOutcome::Completed)
  }

  async fn run_step(&self, step_def: &StepDef<TData>, ctx_data: &ContextData<TData>) -> Result<FlowControl, Err> {
    let name = step_def.name.as_str();

    if let Some(skip_if) = &step_def.skip_if {
      if skip_if(ctx_data.clone()) {
        event!(Level::INFO, "Step skipped by its skip condition.");
        return Ok(FlowControl::Continue);
      }
    }

    let has_handlers = [&self.before, &self.on, &self.after]
      .iter()
      .any(|phase| phase.get(name).is_some_and(|v| !v.is_empty()));
    if !has_handlers {
      if step_def.optional {
        event!(Level::DEBUG, "Optional step has no handlers, skipping.");
        return Ok(FlowControl::Continue);
      }
      return Err(Err::from(FlowError::HandlerMissing {
        flow: self.name.to_string(),
        step_name: step_def.name.clone(),
      }));
    }

    for (phase, handlers) in [
      ("before", self.before.get(name)),
      ("on", self.on.get(name)),
      ("after", self.after.get(name)),
    ] {
      if run_phase(phase, handlers, ctx_data).await? == FlowControl::Stop {
        return Ok(FlowControl::Stop);
      }
    }
    Ok(FlowControl::Continue)
  }
}

async fn run_phase<TData, Err>(
  phase: &'static str,
  handlers: Option<&Vec<Handler<TData, Err>>>,
  ctx_data: &ContextData<TData>,
) -> Result<FlowControl, Err>
where
  TData: 'static + Send + Sync,
{
  for (handler_idx, handler_fn) in handlers.into_iter().flatten().enumerate() {
    let handler_span = span!(Level::DEBUG, "flow_handler", phase, handler_index = handler_idx);
    if handler_fn(ctx_data.clone()).instrument(handler_span).await? == FlowControl::Stop {
      return Ok(FlowControl::Stop);
    }
  }
  Ok(FlowControl::Continue)
}
