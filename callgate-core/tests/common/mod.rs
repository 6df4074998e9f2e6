#![allow(dead_code)]

use async_trait::async_trait;
use callgate_auth::{EntityPolicy, InMemoryPrincipalStore, PolicyPermissions, Principal};
use callgate_core::{ServiceCallHandler, ServiceEngine, ServiceResult};
use callgate_model::{Entity, HandlerError, Platform, ServiceHandler, SimpleEntity};
use callgate_types::ServiceCall;
use std::collections::HashSet;
use std::io;
use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

// ── Log capture ──────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Captures every event on the current thread until the guard drops.
pub fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

// ── Services ─────────────────────────────────────────────────────

/// Records every call it receives.
#[derive(Default)]
pub struct RecordingService {
    calls: Mutex<Vec<ServiceCall>>,
}

impl RecordingService {
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServiceCallHandler for RecordingService {
    async fn handle(&self, call: ServiceCall) -> ServiceResult<()> {
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

/// Entity handler that records the entities it ran on and fails for a
/// configurable set of them.
#[derive(Default)]
pub struct EntityRecorder {
    seen: Mutex<Vec<String>>,
    fail_on: HashSet<String>,
}

impl EntityRecorder {
    pub fn failing_on(ids: &[&str]) -> Self {
        Self {
            seen: Mutex::default(),
            fail_on: ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub fn seen_sorted(&self) -> Vec<String> {
        let mut seen = self.seen();
        seen.sort();
        seen
    }
}

#[async_trait]
impl ServiceHandler for EntityRecorder {
    async fn call_entity(
        &self,
        entity: &Arc<dyn Entity>,
        call: &ServiceCall,
    ) -> Result<(), HandlerError> {
        if self.fail_on.contains(entity.entity_id()) {
            return Err(HandlerError::Failed(format!(
                "{} refused {}",
                entity.entity_id(),
                call.service()
            )));
        }
        self.seen.lock().unwrap().push(entity.entity_id().to_string());
        Ok(())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────

pub const MOCK_USER: &str = "mock-id";

/// A user allowed to control `light.kitchen` only, and an owner.
pub async fn principals() -> Arc<InMemoryPrincipalStore> {
    let store = InMemoryPrincipalStore::new();
    let policy: EntityPolicy = serde_json::from_value(serde_json::json!({
        "entities": {"entity_ids": {"light.kitchen": true}}
    }))
    .unwrap();
    store
        .insert(Principal::new(
            MOCK_USER,
            "Mock User",
            Arc::new(PolicyPermissions::new(&policy)),
        ))
        .await;
    store.insert(Principal::owner("owner-id", "Owner")).await;
    Arc::new(store)
}

pub fn platform(name: &str, ids: &[&str]) -> Arc<Platform> {
    let mut platform = Platform::new(name);
    for id in ids {
        platform
            .add_entity(Arc::new(SimpleEntity::new(id)))
            .unwrap();
    }
    Arc::new(platform)
}

/// One platform holding `light.kitchen` and `light.living_room`.
pub fn mock_platforms() -> Vec<Arc<Platform>> {
    vec![platform("test_domain", &["light.kitchen", "light.living_room"])]
}

pub async fn engine() -> ServiceEngine {
    ServiceEngine::builder().principals(principals().await).build()
}
