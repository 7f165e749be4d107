use crate::application::ports::RemoteDataApi;
use crate::domain::value_objects::{ExerciseType, ScenarioId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

const CREATE_HISTORY: &str = "createHistory";
const UPDATE_PROGRESS: &str = "updateProgress";
const SAVE_SCENARIO: &str = "saveScenario";
const GET_SCENARIO: &str = "getScenario";
const GET_EXERCISE: &str = "getExercise";

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    operation: &'a str,
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    data: Value,
}

/// RPC-style JSON client: `POST <base>/rpc/<operation>` with
/// `{"operation", "arguments"}`, answered by `{"data": ...}`.
pub struct HttpRemoteDataApi {
    client: Client,
    base_url: String,
}

impl HttpRemoteDataApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        if base_url.trim().is_empty() {
            return Err(AppError::ConfigurationError(
                "Remote API URL is empty".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::ConfigurationError(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim().to_string(),
        })
    }

    async fn call(&self, operation: &str, arguments: Value) -> Result<Value, AppError> {
        let url = build_url(&self.base_url, &format!("rpc/{operation}"));
        let response = self
            .client
            .post(url)
            .json(&RpcRequest {
                operation,
                arguments,
            })
            .send()
            .await
            .map_err(|err| AppError::Network(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AppError::Network(err.to_string()))?;
        if !status.is_success() {
            return Err(AppError::Network(format!(
                "Remote API error ({status}) for {operation}: {body}"
            )));
        }

        let envelope: RpcResponse = serde_json::from_str(&body)
            .map_err(|err| AppError::DeserializationError(err.to_string()))?;
        Ok(decode_data(envelope.data))
    }
}

fn build_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

/// Unwraps payloads the backend returns as JSON-encoded strings.
fn decode_data(data: Value) -> Value {
    match data {
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(decoded @ (Value::Object(_) | Value::Array(_) | Value::Null)) => decoded,
            _ => Value::String(raw),
        },
        other => other,
    }
}

fn non_null(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        other => Some(other),
    }
}

fn identifier(value: &Value, field: &str) -> Result<String, AppError> {
    match value {
        Value::String(id) => Ok(id.clone()),
        Value::Object(map) => map
            .get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::DeserializationError(format!("Response is missing `{field}`"))
            }),
        _ => Err(AppError::DeserializationError(
            "Response carries no identifier".to_string(),
        )),
    }
}

#[async_trait]
impl RemoteDataApi for HttpRemoteDataApi {
    async fn create_history(&self, record: &Value) -> Result<String, AppError> {
        let data = self
            .call(CREATE_HISTORY, json!({ "input": record }))
            .await?;
        identifier(&data, "id")
    }

    async fn update_progress(&self, progress: &Value) -> Result<(), AppError> {
        self.call(UPDATE_PROGRESS, json!({ "input": progress }))
            .await?;
        Ok(())
    }

    async fn save_scenario(&self, scenario: &Value) -> Result<String, AppError> {
        let data = self
            .call(SAVE_SCENARIO, json!({ "input": scenario }))
            .await?;
        identifier(&data, "id")
    }

    async fn fetch_scenario(&self, id: &ScenarioId) -> Result<Option<Value>, AppError> {
        let data = self.call(GET_SCENARIO, json!({ "id": id })).await?;
        Ok(non_null(data))
    }

    async fn fetch_exercise(
        &self,
        scenario_id: &ScenarioId,
        exercise_type: ExerciseType,
    ) -> Result<Option<Value>, AppError> {
        let data = self
            .call(
                GET_EXERCISE,
                json!({ "scenarioId": scenario_id, "exerciseType": exercise_type }),
            )
            .await?;
        Ok(non_null(data))
    }
}
