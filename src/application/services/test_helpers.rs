use crate::application::ports::{ConnectivityProbe, LocalStore, RemoteDataApi};
use crate::application::services::ConnectivityMonitor;
use crate::domain::entities::Scenario;
use crate::domain::value_objects::{ExerciseType, ScenarioId};
use crate::infrastructure::connectivity::ManualConnectivity;
use crate::infrastructure::database::ConnectionPool;
use crate::infrastructure::offline::SqliteLocalStore;
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) async fn memory_store() -> (Arc<dyn LocalStore>, ConnectionPool) {
    let pool = ConnectionPool::from_memory().await.unwrap();
    pool.migrate().await.unwrap();
    (Arc::new(SqliteLocalStore::new(pool.clone())), pool)
}

pub(crate) fn scenario(id: &str) -> Scenario {
    Scenario::from_value(scenario_json(id)).unwrap()
}

pub(crate) fn scenario_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Scenario {id}"),
        "description": "At the market",
        "difficulty": "beginner",
        "sentences": [
            {"source": "How much is this?", "target": "¿Cuánto cuesta esto?", "targetHighlights": ["cuesta"]},
            {"source": "Too expensive", "target": "Demasiado caro"}
        ]
    })
}

pub(crate) fn swipe_json() -> Value {
    json!([{"word": "caro", "translation": "expensive", "isCorrect": true}])
}

pub(crate) fn matching_json() -> Value {
    json!({"pairs": [{"source": "cheap", "target": "barato"}]})
}

pub(crate) fn sid(id: &str) -> ScenarioId {
    ScenarioId::new(id.to_string()).unwrap()
}

pub(crate) struct StaticProbe(pub AtomicBool);

#[async_trait]
impl ConnectivityProbe for StaticProbe {
    async fn probe(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Monitor whose state is driven only by `platform.set_online`.
pub(crate) fn monitor(online: bool) -> (Arc<ConnectivityMonitor>, Arc<ManualConnectivity>) {
    let platform = Arc::new(ManualConnectivity::new(online));
    let monitor = ConnectivityMonitor::new(
        platform.clone(),
        Arc::new(StaticProbe(AtomicBool::new(true))),
        Duration::from_secs(3_600),
    );
    monitor.start();
    (monitor, platform)
}

/// Remote API double that records every call in order.
#[derive(Default)]
pub(crate) struct RecordingRemote {
    pub calls: Mutex<Vec<String>>,
    pub failing: Mutex<HashSet<String>>,
    pub scenarios: Mutex<HashMap<String, Value>>,
    pub exercises: Mutex<HashMap<(String, ExerciseType), Value>>,
    /// Number of upcoming fetches that fail with a network error.
    pub transient_fetch_failures: AtomicUsize,
    /// While set, `create_history` never completes.
    pub stall: AtomicBool,
}

impl RecordingRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail(&self, operation: &str) {
        self.failing.lock().unwrap().insert(operation.to_string());
    }

    pub fn heal(&self, operation: &str) {
        self.failing.lock().unwrap().remove(operation);
    }

    pub fn with_exercise(&self, scenario_id: &str, kind: ExerciseType, value: Value) {
        self.exercises
            .lock()
            .unwrap()
            .insert((scenario_id.to_string(), kind), value);
    }

    pub fn with_scenario(&self, scenario_id: &str, value: Value) {
        self.scenarios
            .lock()
            .unwrap()
            .insert(scenario_id.to_string(), value);
    }

    fn record(&self, call: String) -> Result<(), AppError> {
        let operation = call.split(':').next().unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(&operation) {
            return Err(AppError::Network(format!("{operation} unavailable")));
        }
        Ok(())
    }

    fn transient_failure(&self) -> Result<(), AppError> {
        let remaining = self.transient_fetch_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_fetch_failures
                .store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::Network("connection reset".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteDataApi for RecordingRemote {
    async fn create_history(&self, record: &Value) -> Result<String, AppError> {
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.record(format!("create_history:{record}"))?;
        Ok("history-1".into())
    }

    async fn update_progress(&self, progress: &Value) -> Result<(), AppError> {
        self.record(format!("update_progress:{progress}"))
    }

    async fn save_scenario(&self, scenario: &Value) -> Result<String, AppError> {
        self.record(format!("save_scenario:{scenario}"))?;
        Ok(scenario
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("generated")
            .to_string())
    }

    async fn fetch_scenario(&self, id: &ScenarioId) -> Result<Option<Value>, AppError> {
        self.record(format!("fetch_scenario:{id}"))?;
        self.transient_failure()?;
        Ok(self.scenarios.lock().unwrap().get(id.as_str()).cloned())
    }

    async fn fetch_exercise(
        &self,
        scenario_id: &ScenarioId,
        exercise_type: ExerciseType,
    ) -> Result<Option<Value>, AppError> {
        self.record(format!("fetch_exercise:{scenario_id}/{exercise_type}"))?;
        self.transient_failure()?;
        Ok(self
            .exercises
            .lock()
            .unwrap()
            .get(&(scenario_id.to_string(), exercise_type))
            .cloned())
    }
}
