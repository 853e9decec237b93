mod common;

use std::time::Duration;

use common::{count_warnings, Reply, ScriptedModel, ANSWER_JSON, SUMMARY_JSON};
use nt_core::{Error, GenerationOptions, ResponseSchema, StructuredResult};
use nt_inference::{ModelGateway, RawResponse, RetryPolicy};
use tokio::time::Instant;

fn assert_elapsed(start: Instant, expected: Duration) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(50),
        "slept {:?}, expected {:?}",
        elapsed,
        expected
    );
}

fn answer_options() -> GenerationOptions {
    GenerationOptions::structured(ResponseSchema::Answer)
}

#[tokio::test]
async fn test_call_decodes_requested_schema() {
    let model = ScriptedModel::always(ANSWER_JSON);
    let gateway = ModelGateway::new(model.clone(), RetryPolicy::default());

    let raw = gateway.call("m", "prompt", &answer_options()).await.unwrap();
    assert!(matches!(raw.parsed, Some(StructuredResult::Answer(_))));

    let raw = gateway.call("m", "prompt", &GenerationOptions::default()).await.unwrap();
    assert_eq!(raw.text, ANSWER_JSON);
    assert!(raw.parsed.is_none());
}

#[tokio::test]
async fn test_call_does_not_retry() {
    let model = ScriptedModel::new(vec![Reply::Transport], Reply::text(ANSWER_JSON));
    let gateway = ModelGateway::new(model.clone(), RetryPolicy::default());

    let err = gateway.call("m", "prompt", &answer_options()).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(model.calls(), 1);

    // Shape mismatch is not an error at this level.
    let model = ScriptedModel::always("{\"unexpected\": true}");
    let gateway = ModelGateway::new(model.clone(), RetryPolicy::default());
    let raw = gateway.call("m", "prompt", &answer_options()).await.unwrap();
    assert!(raw.parsed.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_validation_failures_then_success() {
    let warnings = count_warnings();
    let model = ScriptedModel::new(
        vec![Reply::text("not json"), Reply::text(SUMMARY_JSON)],
        Reply::text(ANSWER_JSON),
    );
    let gateway = ModelGateway::new(model.clone(), RetryPolicy::default());

    let start = Instant::now();
    let raw = gateway.call_validated("m", "prompt", &answer_options()).await.unwrap();

    // Neither plain text nor a summary decodes as an answer.
    assert!(matches!(raw.parsed, Some(StructuredResult::Answer(_))));
    assert_eq!(model.calls(), 3);
    assert_eq!(warnings.get(), 2);
    assert_elapsed(start, Duration::from_millis(2500));
}

#[tokio::test(start_paused = true)]
async fn test_always_failing_gives_up_after_budget() {
    let warnings = count_warnings();
    let model = ScriptedModel::always("[]");
    let gateway = ModelGateway::new(model.clone(), RetryPolicy::default());

    let start = Instant::now();
    let err = gateway
        .call_validated("m", "prompt", &answer_options())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert!(err.to_string().contains("AnswerResult"));
    assert_eq!(model.calls(), 3);
    assert_eq!(warnings.get(), 3);
    // 1.5^0 + 1.5^1 seconds, and no sleep after the last attempt.
    assert_elapsed(start, Duration::from_millis(2500));
}

#[tokio::test(start_paused = true)]
async fn test_transport_and_service_errors_are_retried() {
    let warnings = count_warnings();
    let model = ScriptedModel::new(vec![Reply::Transport, Reply::Service], Reply::text(ANSWER_JSON));
    let gateway = ModelGateway::new(model.clone(), RetryPolicy::default());

    let raw = gateway.call_validated("m", "prompt", &answer_options()).await.unwrap();
    assert!(raw.parsed.is_some());
    assert_eq!(model.calls(), 3);
    assert_eq!(warnings.get(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_last_transport_error_is_terminal() {
    let model = ScriptedModel::new(vec![Reply::Service, Reply::Service], Reply::Transport);
    let gateway = ModelGateway::new(model.clone(), RetryPolicy::default());

    let err = gateway
        .call_validated("m", "prompt", &answer_options())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
}

#[tokio::test(start_paused = true)]
async fn test_config_error_is_not_retried() {
    let warnings = count_warnings();
    let model = ScriptedModel::new(vec![Reply::Config], Reply::text(ANSWER_JSON));
    let gateway = ModelGateway::new(model.clone(), RetryPolicy::default());

    let start = Instant::now();
    let err = gateway
        .call_validated("m", "prompt", &answer_options())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config(ref m) if m == "bad key"));
    assert_eq!(model.calls(), 1);
    assert_eq!(warnings.get(), 0);
    assert_elapsed(start, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_custom_policy_and_predicate() {
    let model = ScriptedModel::always(ANSWER_JSON);
    let gateway = ModelGateway::new(model.clone(), RetryPolicy::default());
    let policy = RetryPolicy::new(5, 2.0);

    let start = Instant::now();
    let err = gateway
        .call_with_validation("m", "prompt", &answer_options(), &policy, |_: &RawResponse| false)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(model.calls(), 5);
    // 1 + 2 + 4 + 8 seconds.
    assert_elapsed(start, Duration::from_secs(15));
}
