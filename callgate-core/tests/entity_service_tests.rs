mod common;

use callgate_auth::PermissionCategory;
use callgate_core::{
    EngineConfig, EntityTarget, GroupRegistry, PlatformDispatcher, ServiceEngine, ServiceError,
    candidate_entities,
};
use callgate_model::{Entity, Platform, SimpleEntity};
use callgate_types::{Context, ServiceCall};
use common::{EntityRecorder, MOCK_USER, capture_logs, mock_platforms, platform};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

const DEPRECATION: &str = "Not passing an entity ID to a service to target all entities is deprecated";

fn call_for(user: Option<&str>, target: Option<serde_json::Value>) -> ServiceCall {
    let context = user.map(Context::for_user).unwrap_or_default();
    let builder = ServiceCall::builder("test_domain", "test_service").context(context);
    match target {
        Some(target) => builder.target(target).build(),
        None => builder.build(),
    }
}

// ── Authorization ────────────────────────────────────────────────

#[tokio::test]
async fn unknown_user_is_rejected_before_anything_runs() {
    let engine = common::engine().await;
    let handler = EntityRecorder::default();

    let err = engine
        .entity_service_call(
            &mock_platforms(),
            &handler,
            &call_for(Some("non-existing"), Some(json!("light.does_not_exist"))),
        )
        .await
        .unwrap_err();

    match err {
        ServiceError::UnknownUser { context } => {
            assert_eq!(context.user_id.as_deref(), Some("non-existing"));
        }
        other => panic!("expected UnknownUser, got {other:?}"),
    }
    assert!(handler.seen().is_empty());
}

#[tokio::test]
async fn target_all_is_filtered_to_permitted_entities() {
    let engine = common::engine().await;
    let handler = EntityRecorder::default();
    let (logs, _guard) = capture_logs();

    engine
        .entity_service_call(
            &mock_platforms(),
            &handler,
            &call_for(Some(MOCK_USER), Some(json!("*"))),
        )
        .await
        .unwrap();

    assert_eq!(handler.seen(), vec!["light.kitchen"]);
    assert!(!logs.contents().contains(DEPRECATION));
}

#[tokio::test]
async fn omitted_target_for_user_is_filtered_and_warns() {
    let engine = common::engine().await;
    let handler = EntityRecorder::default();
    let (logs, _guard) = capture_logs();

    engine
        .entity_service_call(&mock_platforms(), &handler, &call_for(Some(MOCK_USER), None))
        .await
        .unwrap();

    assert_eq!(handler.seen(), vec!["light.kitchen"]);
    assert!(logs.contents().contains(DEPRECATION));
}

#[tokio::test]
async fn specific_permitted_target_is_called() {
    let engine = common::engine().await;
    let handler = EntityRecorder::default();

    engine
        .entity_service_call(
            &mock_platforms(),
            &handler,
            &call_for(Some(MOCK_USER), Some(json!("light.kitchen"))),
        )
        .await
        .unwrap();

    assert_eq!(handler.seen(), vec!["light.kitchen"]);
}

#[tokio::test]
async fn explicit_target_without_permission_is_unauthorized() {
    let engine = common::engine().await;
    let handler = EntityRecorder::default();

    let err = engine
        .entity_service_call(
            &mock_platforms(),
            &handler,
            &call_for(Some(MOCK_USER), Some(json!("light.living_room"))),
        )
        .await
        .unwrap_err();

    match err {
        ServiceError::Unauthorized {
            context,
            entity_id,
            permission,
        } => {
            assert_eq!(entity_id, "light.living_room");
            assert_eq!(context.user_id.as_deref(), Some(MOCK_USER));
            assert_eq!(permission, PermissionCategory::Control);
        }
        other => panic!("expected Unauthorized, got {other:?}"),
    }
    assert!(handler.seen().is_empty());
}

#[tokio::test]
async fn partially_permitted_target_calls_permitted_subset() {
    let engine = common::engine().await;
    let handler = EntityRecorder::default();

    engine
        .entity_service_call(
            &mock_platforms(),
            &handler,
            &call_for(
                Some(MOCK_USER),
                Some(json!(["light.living_room", "light.kitchen"])),
            ),
        )
        .await
        .unwrap();

    assert_eq!(handler.seen(), vec!["light.kitchen"]);
}

#[tokio::test]
async fn owner_may_control_everything() {
    let engine = common::engine().await;
    let handler = EntityRecorder::default();

    engine
        .entity_service_call(
            &mock_platforms(),
            &handler,
            &call_for(Some("owner-id"), Some(json!("*"))),
        )
        .await
        .unwrap();

    assert_eq!(handler.seen(), vec!["light.kitchen", "light.living_room"]);
}

#[tokio::test]
async fn trusted_call_without_target_reaches_all_and_warns() {
    let engine = common::engine().await;
    let handler = EntityRecorder::default();
    let (logs, _guard) = capture_logs();

    engine
        .entity_service_call(&mock_platforms(), &handler, &call_for(None, None))
        .await
        .unwrap();

    assert_eq!(handler.seen(), vec!["light.kitchen", "light.living_room"]);
    let logs = logs.contents();
    assert!(logs.contains(DEPRECATION));
    assert!(logs.contains("test_domain.test_service"));
}

#[tokio::test]
async fn omitted_target_warning_can_be_disabled() {
    let engine = ServiceEngine::builder()
        .config(EngineConfig {
            warn_on_omitted_target: false,
            ..EngineConfig::default()
        })
        .build();
    let handler = EntityRecorder::default();
    let (logs, _guard) = capture_logs();

    engine
        .entity_service_call(&mock_platforms(), &handler, &call_for(None, None))
        .await
        .unwrap();

    assert_eq!(handler.seen().len(), 2);
    assert!(!logs.contents().contains(DEPRECATION));
}

#[tokio::test]
async fn trusted_specific_target_drops_unknown_ids() {
    let engine = common::engine().await;
    let handler = EntityRecorder::default();

    let summary = engine
        .entity_service_call(
            &mock_platforms(),
            &handler,
            &call_for(None, Some(json!(["light.kitchen", "light.non_existing"]))),
        )
        .await
        .unwrap();

    assert_eq!(handler.seen(), vec!["light.kitchen"]);
    assert_eq!(summary.launched, vec!["test_domain"]);
}

#[tokio::test]
async fn target_matching_nothing_is_a_no_op() {
    let engine = common::engine().await;
    let handler = EntityRecorder::default();

    let summary = engine
        .entity_service_call(
            &mock_platforms(),
            &handler,
            &call_for(Some(MOCK_USER), Some(json!("light.non_existing"))),
        )
        .await
        .unwrap();

    assert!(handler.seen().is_empty());
    assert!(summary.launched.is_empty());
}

// ── Dispatch ─────────────────────────────────────────────────────

#[tokio::test]
async fn failing_platform_does_not_affect_siblings() {
    let engine = common::engine().await;
    let platforms = vec![
        platform("broken", &["switch.bad"]),
        platform("healthy", &["switch.good", "switch.other"]),
    ];
    let handler = EntityRecorder::failing_on(&["switch.bad"]);

    let summary = engine
        .entity_service_call(&platforms, &handler, &call_for(None, Some(json!("*"))))
        .await
        .unwrap();

    assert_eq!(summary.launched, vec!["broken", "healthy"]);
    assert_eq!(summary.failed, vec!["broken"]);
    assert_eq!(handler.seen_sorted(), vec!["switch.good", "switch.other"]);
}

#[tokio::test]
async fn unavailable_entities_are_skipped_and_polled_ones_updated() {
    let engine = common::engine().await;
    let polled = Arc::new(SimpleEntity::new("sensor.polled").polled());
    let offline = Arc::new(SimpleEntity::new("sensor.offline").unavailable());
    let platforms = vec![Arc::new(
        Platform::new("sensors")
            .with_entity(polled.clone())
            .unwrap()
            .with_entity(offline.clone())
            .unwrap(),
    )];
    let handler = EntityRecorder::default();

    engine
        .entity_service_call(&platforms, &handler, &call_for(None, Some(json!("*"))))
        .await
        .unwrap();

    assert_eq!(handler.seen(), vec!["sensor.polled"]);
    assert_eq!(polled.update_count(), 1);
    assert_eq!(offline.update_count(), 0);
}

#[test]
fn plan_keeps_platform_and_registration_order() {
    let platforms = vec![
        platform("b", &["light.b2", "light.b1"]),
        platform("empty", &["light.unused"]),
        platform("a", &["light.a1"]),
    ];
    let candidates = candidate_entities(
        &platforms,
        &EntityTarget::Ids(vec!["light.a1".into(), "light.b1".into(), "light.b2".into()]),
    );

    let plan: Vec<(String, Vec<String>)> = PlatformDispatcher::plan(&platforms, &candidates)
        .into_iter()
        .map(|(platform, entities)| {
            (
                platform.name().to_string(),
                entities.iter().map(|e| e.entity_id().to_string()).collect(),
            )
        })
        .collect();

    assert_eq!(
        plan,
        vec![
            ("b".to_string(), vec!["light.b2".to_string(), "light.b1".to_string()]),
            ("a".to_string(), vec!["light.a1".to_string()]),
        ]
    );
}

// ── Target extraction ────────────────────────────────────────────

fn engine_with_groups() -> ServiceEngine {
    let groups = Arc::new(GroupRegistry::new());
    groups.create_group("test", ["light.Ceiling", "light.Kitchen"]);
    groups.create_group("nested", ["group.test", "switch.heater", "group.nested"]);
    ServiceEngine::builder().groups(groups).build()
}

#[test]
fn extract_entity_ids_expands_groups() {
    let engine = engine_with_groups();
    let call = call_for(None, Some(json!("light.Bowl, group.test")));

    assert_eq!(
        engine.extract_entity_ids(&call, true),
        vec!["light.bowl", "light.ceiling", "light.kitchen"]
    );
    assert_eq!(
        engine.extract_entity_ids(&call, false),
        vec!["light.bowl", "group.test"]
    );
}

#[test]
fn extract_entity_ids_handles_nested_and_cyclic_groups() {
    let engine = engine_with_groups();
    let call = call_for(None, Some(json!(["group.nested", "light.kitchen"])));

    assert_eq!(
        engine.extract_entity_ids(&call, true),
        vec!["light.ceiling", "light.kitchen", "switch.heater"]
    );
}

#[test]
fn extract_entity_ids_is_empty_for_all_and_unknown_groups() {
    let engine = engine_with_groups();

    assert!(engine.extract_entity_ids(&call_for(None, Some(json!("*"))), true).is_empty());
    assert!(engine.extract_entity_ids(&call_for(None, None), true).is_empty());
    assert!(
        engine
            .extract_entity_ids(&call_for(None, Some(json!("group.missing"))), true)
            .is_empty()
    );
}

#[test]
fn candidates_follow_platform_order() {
    let platforms = vec![
        platform("first", &["light.z"]),
        platform("second", &["light.a"]),
    ];
    let ids: Vec<String> = candidate_entities(&platforms, &EntityTarget::All)
        .iter()
        .map(|e| e.entity_id().to_string())
        .collect();
    assert_eq!(ids, vec!["light.z", "light.a"]);
}
