#![allow(dead_code)]

use async_trait::async_trait;
use lingua_offline::application::ports::{ConnectivityProbe, RemoteDataApi};
use lingua_offline::domain::value_objects::{ExerciseType, ScenarioId};
use lingua_offline::infrastructure::connectivity::ManualConnectivity;
use lingua_offline::infrastructure::database::ConnectionPool;
use lingua_offline::state::{AppState, Adapters};
use lingua_offline::{AppConfig, AppError};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct ScriptedProbe {
    pub reachable: AtomicBool,
}

#[async_trait]
impl ConnectivityProbe for ScriptedProbe {
    async fn probe(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct RecordingRemote {
    pub calls: Mutex<Vec<String>>,
    pub exercises: Mutex<HashMap<(String, ExerciseType), Value>>,
    pub failing: AtomicBool,
}

impl RecordingRemote {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Network("remote unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteDataApi for RecordingRemote {
    async fn create_history(&self, record: &Value) -> Result<String, AppError> {
        self.record(format!("create_history:{}", record["id"]))?;
        Ok("history-1".into())
    }

    async fn update_progress(&self, progress: &Value) -> Result<(), AppError> {
        self.record(format!("update_progress:{}", progress["id"]))
    }

    async fn save_scenario(&self, scenario: &Value) -> Result<String, AppError> {
        self.record(format!("save_scenario:{}", scenario["id"]))?;
        Ok("scenario-1".into())
    }

    async fn fetch_scenario(&self, id: &ScenarioId) -> Result<Option<Value>, AppError> {
        self.record(format!("fetch_scenario:{id}"))?;
        Ok(None)
    }

    async fn fetch_exercise(
        &self,
        scenario_id: &ScenarioId,
        exercise_type: ExerciseType,
    ) -> Result<Option<Value>, AppError> {
        self.record(format!("fetch_exercise:{scenario_id}/{exercise_type}"))?;
        Ok(self
            .exercises
            .lock()
            .unwrap()
            .get(&(scenario_id.to_string(), exercise_type))
            .cloned())
    }
}

pub struct TestContext {
    pub state: AppState,
    pub platform: Arc<ManualConnectivity>,
    pub probe: Arc<ScriptedProbe>,
    pub remote: Arc<RecordingRemote>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.url = "sqlite::memory:".into();
    config.sync.backoff_base_ms = 20;
    config.sync.reconnect_delay_ms = 10;
    config.remote.read_retries = 2;
    config.remote.read_retry_delay_ms = 5;
    config.session.debounce_ms = 20;
    config
}

pub async fn setup(online: bool) -> TestContext {
    setup_with(online, test_config()).await
}

pub async fn setup_with(online: bool, config: AppConfig) -> TestContext {
    let pool = ConnectionPool::from_memory()
        .await
        .expect("in-memory sqlite");
    pool.migrate().await.expect("migrations");

    let platform = Arc::new(ManualConnectivity::new(online));
    let probe = Arc::new(ScriptedProbe {
        reachable: AtomicBool::new(true),
    });
    let remote = Arc::new(RecordingRemote::default());

    let state = AppState::assemble(
        config,
        pool,
        Adapters {
            platform: platform.clone(),
            probe: probe.clone(),
            remote: remote.clone(),
            response_caches: None,
        },
    )
    .await;

    TestContext {
        state,
        platform,
        probe,
        remote,
    }
}

pub fn sid(id: &str) -> ScenarioId {
    ScenarioId::new(id.to_string()).expect("scenario id")
}

pub fn scenario_value(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Scenario {id}"),
        "description": "Ordering at a cafe",
        "difficulty": "intermediate",
        "sentences": [
            {"source": "A coffee, please", "target": "Un café, por favor", "targetHighlights": ["café"]},
            {"source": "The bill, please", "target": "La cuenta, por favor"}
        ]
    })
}

pub async fn wait_until<F: Fn() -> bool>(check: F) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
