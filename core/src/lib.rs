// nueats/core/src/lib.rs

//! Step-pipeline engine behind the NuEats order-lifecycle functions.
//!
//! Every lifecycle operation (auto-ready sweep, payment initiation, webhook
//! reconciliation, order e-mail) is a [`Pipeline`] of named steps running
//! against one shared [`ContextData`]. Each step has `before`, `on` and `after`
//! phases; any handler may stop the run early or fail it.
//!
//! Pipelines are registered once in a [`Registry`] keyed by their context type,
//! so request handlers only need to build a context and call `registry.run(ctx)`.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::Registry;
