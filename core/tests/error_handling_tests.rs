// tests/error_handling_tests.rs
mod common;

use common::*;
use nueats_core::{ContextData, FlowError, Pipeline, PipelineControl};

#[test]
fn anyhow_errors_become_handler_errors() {
  let err: FlowError = anyhow::anyhow!("mail relay timed out").into();
  match &err {
    FlowError::HandlerError { source } => assert_eq!(source.to_string(), "mail relay timed out"),
    other => panic!("expected HandlerError, got {:?}", other),
  }
  assert!(err.to_string().contains("mail relay timed out"));
}

#[tokio::test]
async fn pipeline_may_use_flow_error_as_its_error_type() {
  setup_tracing();
  let mut pipeline = Pipeline::<TicketContext, FlowError>::new(&[("load", false, None), ("update", false, None)]);
  pipeline.on_step("load", |ctx: ContextData<TicketContext>| async move {
    ctx.write().touched = 1;
    Ok::<_, FlowError>(PipelineControl::Continue)
  });
  pipeline.on_step("update", |_ctx: ContextData<TicketContext>| async move {
    Err::<PipelineControl, anyhow::Error>(anyhow::anyhow!("row locked"))
  });

  let ctx = ContextData::new(TicketContext::default());
  let err = pipeline.run(ctx.clone()).await.unwrap_err();
  assert!(matches!(err, FlowError::HandlerError { .. }));
  assert_eq!(ctx.read().touched, 1);
}
