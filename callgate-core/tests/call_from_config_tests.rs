mod common;

use callgate_core::{CallOptions, ConfigError, PrepareError, RenderError, ServiceError};
use callgate_types::{Context, Variables};
use common::{EntityRecorder, MOCK_USER, RecordingService, capture_logs};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;

fn vars(value: Value) -> Variables {
    value.as_object().cloned().unwrap()
}

async fn engine_with_recorder() -> (callgate_core::ServiceEngine, Arc<RecordingService>) {
    let engine = common::engine().await;
    let recorder = Arc::new(RecordingService::default());
    engine
        .registry()
        .register("test_domain", "test_service", recorder.clone())
        .await;
    (engine, recorder)
}

// ── Templates ────────────────────────────────────────────────────

#[tokio::test]
async fn template_service_call_renders_nested_data() {
    let (engine, recorder) = engine_with_recorder().await;
    let config = json!({
        "service_template": "{{ 'test_domain.test_service' }}",
        "entity_id": "hello.world",
        "data_template": {
            "hello": "{{ 'goodbye' }}",
            "data": {"value": "{{ 'complex' }}", "simple": "simple"},
            "list": ["{{ 'list' }}", "2"],
        },
    });

    engine
        .call_from_config(Some(&config), CallOptions::default())
        .await
        .unwrap();

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].domain(), "test_domain");
    assert_eq!(calls[0].service(), "test_service");
    assert_eq!(
        Value::Object(calls[0].data().clone()),
        json!({
            "hello": "goodbye",
            "data": {"value": "complex", "simple": "simple"},
            "list": ["list", "2"],
            "entity_id": ["hello.world"],
        })
    );
}

#[tokio::test]
async fn passes_variables_to_templates() {
    let (engine, recorder) = engine_with_recorder().await;
    let config = json!({
        "service_template": "{{ var_service }}",
        "entity_id": "hello.world",
        "data_template": {"hello": "{{ var_data }}"},
    });
    let options = CallOptions::default().with_variables(vars(json!({
        "var_service": "test_domain.test_service",
        "var_data": "goodbye",
    })));

    engine
        .call_from_config(Some(&config), options)
        .await
        .unwrap();

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].data()["hello"], json!("goodbye"));
}

#[tokio::test]
async fn data_template_overrides_static_data_and_entity_id_wins() {
    let (engine, recorder) = engine_with_recorder().await;
    let config = json!({
        "service": "test_domain.test_service",
        "entity_id": "light.kitchen",
        "data": {"brightness": 10, "transition": 2, "entity_id": "light.ignored"},
        "data_template": {"brightness": "{{ level * 2 }}"},
    });
    let options = CallOptions::default().with_variables(vars(json!({"level": 50})));

    engine
        .call_from_config(Some(&config), options)
        .await
        .unwrap();

    let call = &recorder.calls()[0];
    assert_eq!(call.data()["brightness"], json!("100"));
    assert_eq!(call.data()["transition"], json!(2));
    assert_eq!(call.data()["entity_id"], json!(["light.kitchen"]));
}

#[tokio::test]
async fn bad_data_template_makes_no_call() {
    let (engine, recorder) = engine_with_recorder().await;
    let (logs, _guard) = capture_logs();
    let config = json!({
        "service": "test_domain.test_service",
        "data_template": {"hello": "{{ no_such_variable }}"},
    });

    engine
        .call_from_config(Some(&config), CallOptions::default())
        .await
        .unwrap();

    assert!(recorder.calls().is_empty());
    assert!(logs.contents().contains("Error rendering data template"));
}

#[tokio::test]
async fn broken_service_template_makes_no_call() {
    let (engine, recorder) = engine_with_recorder().await;
    let (logs, _guard) = capture_logs();
    let config = json!({"service_template": "{% if %}"});

    engine
        .call_from_config(Some(&config), CallOptions::default())
        .await
        .unwrap();

    assert!(recorder.calls().is_empty());
    assert!(logs.contents().contains("Error rendering service name template"));
}

#[tokio::test]
async fn service_template_rendering_invalid_name_makes_no_call() {
    let (engine, recorder) = engine_with_recorder().await;
    let (logs, _guard) = capture_logs();
    let config = json!({"service_template": "{{ 'not a service' }}"});

    engine
        .call_from_config(Some(&config), CallOptions::default())
        .await
        .unwrap();

    assert!(recorder.calls().is_empty());
    assert!(logs.contents().contains("Template rendered invalid service"));
}

#[tokio::test]
async fn config_is_not_mutated() {
    let (engine, recorder) = engine_with_recorder().await;
    let config = json!({
        "service": "test_domain.test_service",
        "entity_id": "hello.world, sensor.beer",
        "data": {"hello": "goodbye", "nested": {"list": [1, 2]}},
        "data_template": {"rendered": "{{ 'value' }}"},
    });
    let original = config.clone();

    engine
        .call_from_config(Some(&config), CallOptions::default())
        .await
        .unwrap();
    engine
        .call_from_config(Some(&config), CallOptions::default())
        .await
        .unwrap();

    assert_eq!(config, original);
    assert_eq!(recorder.calls().len(), 2);
}

// ── Validation ───────────────────────────────────────────────────

#[tokio::test]
async fn splits_entity_string_into_list() {
    let (engine, recorder) = engine_with_recorder().await;
    let config = json!({
        "service": "test_domain.test_service",
        "entity_id": "hello.world, sensor.beer",
    });

    engine
        .call_from_config(Some(&config), CallOptions::default())
        .await
        .unwrap();

    assert_eq!(
        recorder.calls()[0].data()["entity_id"],
        json!(["hello.world", "sensor.beer"])
    );
}

#[tokio::test]
async fn fails_silently_on_missing_or_invalid_config() {
    let (engine, recorder) = engine_with_recorder().await;
    let (logs, _guard) = capture_logs();

    engine
        .call_from_config(None, CallOptions::default())
        .await
        .unwrap();
    engine
        .call_from_config(Some(&json!({})), CallOptions::default())
        .await
        .unwrap();
    engine
        .call_from_config(Some(&json!({"service": "invalid"})), CallOptions::default())
        .await
        .unwrap();

    assert!(recorder.calls().is_empty());
    assert_eq!(
        logs.contents()
            .matches("Invalid config for calling service")
            .count(),
        3
    );
}

#[tokio::test]
async fn skipping_validation_passes_target_through() {
    let (engine, recorder) = engine_with_recorder().await;
    let config = json!({
        "service": "Test_Domain.Test_Service",
        "entity_id": "Light.Kitchen",
    });

    engine
        .call_from_config(Some(&config), CallOptions::default().without_validation())
        .await
        .unwrap();

    let call = &recorder.calls()[0];
    assert_eq!(call.domain(), "test_domain");
    assert_eq!(call.service(), "test_service");
    assert_eq!(call.data()["entity_id"], json!("Light.Kitchen"));
}

#[tokio::test]
async fn prepare_call_reports_why_config_was_rejected() {
    let engine = common::engine().await;

    let err = engine
        .prepare_call(
            &json!({"service": "light.turn_on", "entity_id": "not_an_entity"}),
            &CallOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        PrepareError::Config(ConfigError::InvalidEntityId(ref id)) if id == "not_an_entity"
    ));

    let err = engine
        .prepare_call(
            &json!({"service": "light.turn_on", "service_template": "{{ 'light.turn_off' }}"}),
            &CallOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, PrepareError::Config(ConfigError::ServiceKey)));

    let err = engine
        .prepare_call(
            &json!({"service_template": "{{ missing }}"}),
            &CallOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        PrepareError::Render(RenderError::ServiceTemplate(_))
    ));
}

#[tokio::test]
async fn prepare_call_uses_given_context() {
    let engine = common::engine().await;
    let context = Context::for_user(MOCK_USER);

    let call = engine
        .prepare_call(
            &json!({"service": "light.turn_on", "entity_id": "*"}),
            &CallOptions::default().with_context(context.clone()),
        )
        .unwrap();

    assert_eq!(call.context(), &context);
    assert_eq!(call.data()["entity_id"], json!("*"));
}

// ── Outcomes ─────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_service_is_logged_not_raised() {
    let engine = common::engine().await;
    let (logs, _guard) = capture_logs();

    engine
        .call_from_config(
            Some(&json!({"service": "nothing.here"})),
            CallOptions::default(),
        )
        .await
        .unwrap();

    assert!(logs.contents().contains("Unable to find service nothing.here"));
}

#[tokio::test]
async fn authorization_errors_reach_the_caller() {
    let engine = common::engine().await;
    let component = engine.entity_component("light");
    component
        .add_platform(
            callgate_model::Platform::new("test_domain")
                .with_entity(Arc::new(callgate_model::SimpleEntity::new("light.kitchen")))
                .unwrap()
                .with_entity(Arc::new(callgate_model::SimpleEntity::new(
                    "light.living_room",
                )))
                .unwrap(),
        )
        .await;
    let handler = Arc::new(EntityRecorder::default());
    component
        .register_entity_service(engine.registry(), "turn_on", handler.clone(), None)
        .await;

    let config = json!({"service": "light.turn_on", "entity_id": "light.living_room"});
    let err = engine
        .call_from_config(
            Some(&config),
            CallOptions::default().with_context(Context::for_user(MOCK_USER)),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Unauthorized { ref entity_id, .. } if entity_id == "light.living_room"
    ));
    assert!(handler.seen().is_empty());

    let err = engine
        .call_from_config(
            Some(&config),
            CallOptions::default().with_context(Context::for_user("non-existing")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::UnknownUser { .. }));

    engine
        .call_from_config(Some(&config), CallOptions::default())
        .await
        .unwrap();
    assert_eq!(handler.seen(), vec!["light.living_room"]);
}
