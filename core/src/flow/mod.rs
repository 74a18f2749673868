// core/src/flow/mod.rs

//! A small named-step async pipeline.
//!
//! A [`Flow`] is an ordered list of steps. Each step can carry `before`, `on`
//! and `after` handlers that receive the shared [`ContextData`] and answer
//! with a [`FlowControl`]. Discovery and purchase are both expressed as flows.

mod context_data;
mod control;
mod definition;
mod execution;
mod step;

pub use context_data::ContextData;
pub use control::{FlowControl, FlowOutcome};
pub use definition::{Flow, Handler};
pub use step::{SkipCondition, StepDef};
