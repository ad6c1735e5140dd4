// tests/registry_tests.rs
mod common;

use common::*;
use nueats_core::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult, Registry};

#[derive(Clone, Debug, Default)]
struct SweepContext {
  promoted: Vec<i64>,
}

#[derive(Clone, Debug, Default)]
struct MailContext {
  sent: bool,
}

#[tokio::test]
async fn dispatches_by_context_type() {
  setup_tracing();
  let registry = Registry::<TestError>::new();

  let mut sweep = Pipeline::<SweepContext, TestError>::new(&[("promote", false, None)]);
  sweep.on_step("promote", |ctx: ContextData<SweepContext>| async move {
    ctx.write().promoted.push(83);
    Ok::<_, FlowError>(PipelineControl::Continue)
  });
  registry.register_pipeline(sweep);

  let mut mail = Pipeline::<MailContext, TestError>::new(&[("send", false, None)]);
  mail.on_step("send", |ctx: ContextData<MailContext>| async move {
    ctx.write().sent = true;
    Ok::<_, FlowError>(PipelineControl::Continue)
  });
  registry.register_pipeline(mail);

  assert!(registry.is_registered::<SweepContext>());
  assert!(registry.is_registered::<MailContext>());

  let sweep_ctx = ContextData::new(SweepContext::default());
  assert_eq!(registry.run(sweep_ctx.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(sweep_ctx.read().promoted, vec![83]);

  let mail_ctx = ContextData::new(MailContext::default());
  registry.run(mail_ctx.clone()).await.unwrap();
  assert!(mail_ctx.read().sent);
}

#[tokio::test]
async fn unregistered_context_type_is_an_error() {
  setup_tracing();
  let registry = Registry::<TestError>::new();

  let result = registry.run(ContextData::new(MailContext::default())).await;
  match result {
    Err(TestError::Flow(s)) => {
      assert!(s.contains("PipelineNotRegistered"));
      assert!(s.contains("MailContext"));
    }
    other => panic!("expected PipelineNotRegistered, got {:?}", other),
  }
}

#[tokio::test]
async fn later_registration_replaces_earlier_one() {
  setup_tracing();
  let registry = Registry::<TestError>::new();

  let mut first = Pipeline::<TicketContext, TestError>::new(&[("mark", false, None)]);
  first.on_step("mark", recording_handler("first"));
  registry.register_pipeline(first);

  let mut second = Pipeline::<TicketContext, TestError>::new(&[("mark", false, None)]);
  second.on_step("mark", recording_handler("second"));
  registry.register_pipeline(second);

  let ctx = ContextData::new(TicketContext::default());
  registry.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().trail, vec!["second"]);
}

#[tokio::test]
async fn handler_error_surfaces_through_registry() {
  setup_tracing();
  let registry = Registry::<TestError>::new();
  let mut p = Pipeline::<TicketContext, TestError>::new(&[("send", false, None)]);
  p.on_step("send", failing_handler("send", "relay rejected message"));
  registry.register_pipeline(p);

  let result = registry.run(ContextData::new(TicketContext::default())).await;
  assert_eq!(result.unwrap_err(), TestError::Step("relay rejected message".to_string()));
}
