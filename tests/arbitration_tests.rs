//! Integration tests for model arbitration and the session-freeze
//! contract.

use std::sync::Arc;
use std::time::Duration;

use assist_gemini::arbitration::{
    assess_token_pressure, ArbitrationContext, ExecutionMode, KeywordPrivacyClassifier,
    KeywordTaskClassifier, ModelArbitrator, ModelSwitchObserver, PrivacyClassifier, PrivacyLevel,
    TaskClassifier, TaskType, TokenPressure,
};
use assist_gemini::types::{ChatTurn, TurnRole};

fn ctx<'a>(message: &'a str, history: &'a [ChatTurn]) -> ArbitrationContext<'a> {
    ArbitrationContext {
        message,
        history,
        latency_budget: None,
        local_available: true,
        cloud_available: true,
    }
}

#[test]
fn test_keyword_task_detection() {
    let classifier = KeywordTaskClassifier;
    assert_eq!(classifier.classify("refactor the auth module"), TaskType::Refactor);
    assert_eq!(classifier.classify("there is a bug in pagination"), TaskType::Debug);
    assert_eq!(classifier.classify("explain this regex"), TaskType::Analyze);
    assert_eq!(classifier.classify("add docs to the crate root"), TaskType::Document);
    assert_eq!(classifier.classify("implement a bloom filter"), TaskType::Code);
    assert_eq!(classifier.classify("hello!"), TaskType::General);
}

#[test]
fn test_keyword_privacy_detection() {
    let classifier = KeywordPrivacyClassifier;
    assert_eq!(classifier.assess("never log the secret"), PrivacyLevel::Critical);
    assert_eq!(classifier.assess("this file is sensitive"), PrivacyLevel::High);
    assert_eq!(classifier.assess("strip personal info"), PrivacyLevel::Medium);
    assert_eq!(classifier.assess("format this date"), PrivacyLevel::Low);
}

#[test]
fn test_token_pressure_thresholds() {
    assert_eq!(assess_token_pressure("hi", &[]), TokenPressure::Low);

    let history = vec![ChatTurn::text(1, TurnRole::User, "y".repeat(20_000), 0)];
    assert_eq!(assess_token_pressure("hi", &history), TokenPressure::Medium);

    let heavy = vec![ChatTurn::text(1, TurnRole::User, "y".repeat(50_000), 0)];
    assert_eq!(assess_token_pressure("hi", &heavy), TokenPressure::High);
}

#[test]
fn test_privacy_beats_complexity_for_local() {
    let arbitrator = ModelArbitrator::new();
    // Critical privacy pushes local even though "refactor" is complex.
    let result = arbitrator.arbitrate(&ctx("refactor the password hashing", &[]));
    assert_eq!(result.execution_mode, ExecutionMode::Local);
    assert_eq!(result.selected_model, "gemini-nano");
    assert!(!result.alternatives.is_empty());
}

#[test]
fn test_token_pressure_pushes_cloud_pro() {
    let arbitrator = ModelArbitrator::new();
    let heavy = vec![ChatTurn::text(1, TurnRole::User, "y".repeat(50_000), 0)];
    let result = arbitrator.arbitrate(&ctx("summarize the above", &heavy));
    assert_eq!(result.execution_mode, ExecutionMode::Cloud);
    assert_eq!(result.selected_model, "gemini-1.5-pro");
}

#[test]
fn test_tight_latency_budget_prefers_local() {
    let arbitrator = ModelArbitrator::new();
    let mut context = ctx("quick question", &[]);
    context.latency_budget = Some(Duration::from_millis(50));
    let result = arbitrator.arbitrate(&context);
    assert_eq!(result.execution_mode, ExecutionMode::Local);
}

#[test]
fn test_unreachable_preference_degrades_with_fallback_reason() {
    let arbitrator = ModelArbitrator::new();
    let mut context = ctx("keep this secret safe", &[]);
    context.local_available = false;

    let result = arbitrator.arbitrate(&context);
    assert_eq!(result.execution_mode, ExecutionMode::Cloud);
    assert!(result.reason.contains("fallback"));
    assert!(result.confidence < 0.5);
}

#[test]
fn test_session_pin_survives_rescoring_pressure() {
    let arbitrator = ModelArbitrator::new();

    let first = arbitrator.select_for_session(&ctx("hello", &[]));
    let pinned = first.selected_model.clone();

    // A request that would arbitrate differently must not swap the
    // session model underneath the conversation.
    let heavy = vec![ChatTurn::text(1, TurnRole::User, "y".repeat(50_000), 0)];
    let second = arbitrator.select_for_session(&ctx("refactor it all", &heavy));

    assert_eq!(second.selected_model, pinned);
    assert_eq!(second.reason, "session model is pinned");
    assert_eq!(arbitrator.session_model(), Some(pinned));
}

#[test]
fn test_fallback_chain_skips_failed_family_in_order() {
    let arbitrator = ModelArbitrator::new();

    let chain = arbitrator.fallback_chain("gemini-1.5-flash");
    assert_eq!(chain, vec!["gemini-1.5-pro", "gemini-pro", "gemini-nano"]);

    let chain = arbitrator.fallback_chain("gemini-pro");
    assert_eq!(chain, vec!["gemini-2.0-flash", "gemini-1.5-pro", "gemini-nano"]);
}

#[test]
fn test_observer_fires_on_manual_switch_only() {
    struct Recorder(parking_lot::Mutex<Vec<(String, String)>>);
    impl ModelSwitchObserver for Recorder {
        fn on_model_switch(&self, old: &str, new: &str) {
            self.0.lock().push((old.into(), new.into()));
        }
    }

    let recorder = Arc::new(Recorder(parking_lot::Mutex::new(Vec::new())));
    let arbitrator = ModelArbitrator::new().with_observer(recorder.clone());

    // First pin: nothing to switch from.
    arbitrator.pin_model("gemini-1.5-flash", ExecutionMode::Cloud);
    assert!(recorder.0.lock().is_empty());

    arbitrator.pin_model("gemini-1.5-pro", ExecutionMode::Cloud);
    assert_eq!(
        *recorder.0.lock(),
        vec![("gemini-1.5-flash".to_string(), "gemini-1.5-pro".to_string())]
    );
}

#[test]
fn test_custom_classifier_strategy_is_pluggable() {
    struct AlwaysCritical;
    impl PrivacyClassifier for AlwaysCritical {
        fn assess(&self, _message: &str) -> PrivacyLevel {
            PrivacyLevel::Critical
        }
    }

    let arbitrator = ModelArbitrator::new().with_privacy_classifier(Box::new(AlwaysCritical));
    let result = arbitrator.arbitrate(&ctx("totally innocuous", &[]));
    assert_eq!(result.execution_mode, ExecutionMode::Local);
}
