// nueats/core/src/core/context.rs

//! The boxed handler type stored for every step phase.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A type-erased step handler.
///
/// It receives a clone of the run's `ContextData<TData>` and resolves to a
/// [`PipelineControl`] or the pipeline's error type. Handlers copy what they
/// need out of a guard, drop it, and only then await I/O.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;
