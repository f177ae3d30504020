// Maps a tool invocation onto exactly one Airflow REST call

use crate::tools::registry::{self, ParamLocation, ParamSpec, ToolSpec};
use airflow_sdk::{AirflowClient, AirflowError, ClientConfig, Method};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Operation '{0}' not permitted in read-only mode")]
    PermissionDenied(String),

    #[error("Missing required argument '{argument}' for tool '{tool}'")]
    MissingArgument { tool: String, argument: String },

    #[error(transparent)]
    Upstream(#[from] AirflowError),
}

/// A fully resolved upstream request.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamCall {
    pub method: Method,
    /// Path segments below the API prefix, ids kept whole.
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl UpstreamCall {
    /// Resolve a tool's arguments against its table entry, applying defaults.
    pub fn plan(spec: &ToolSpec, arguments: &Map<String, Value>) -> Result<Self, DispatchError> {
        let mut segments: Vec<String> = spec
            .path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let mut query = Vec::new();
        let mut body = Map::new();

        for (key, literal) in spec.fixed_body {
            body.insert(key.to_string(), literal.to_value());
        }

        for param in spec.params {
            let Some(value) = resolve(spec, param, arguments)? else {
                continue;
            };
            match param.location {
                ParamLocation::Path => {
                    let segment = scalar_text(&value);
                    if segment.is_empty() {
                        return Err(missing(spec, param));
                    }
                    let placeholder = format!("{{{}}}", param.name);
                    for slot in segments.iter_mut().filter(|s| **s == placeholder) {
                        slot.clone_from(&segment);
                    }
                }
                ParamLocation::Query => query.push((param.name.to_string(), scalar_text(&value))),
                // An empty `conf` means no conf at all.
                ParamLocation::Body if is_empty_object(&value) => {}
                ParamLocation::Body => {
                    body.insert(param.name.to_string(), value);
                }
            }
        }

        let has_body = !spec.fixed_body.is_empty()
            || spec.params.iter().any(|p| p.location == ParamLocation::Body);

        Ok(Self {
            method: spec.verb.into(),
            segments,
            query,
            body: has_body.then_some(Value::Object(body)),
        })
    }

    /// Slash-joined path, for logs.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(Map::is_empty)
}

/// Argument value, falling back to the declared default. Explicit `null`
/// counts as absent.
fn resolve(
    spec: &ToolSpec,
    param: &ParamSpec,
    arguments: &Map<String, Value>,
) -> Result<Option<Value>, DispatchError> {
    match arguments.get(param.name) {
        Some(value) if !value.is_null() => Ok(Some(value.clone())),
        _ => match param.default {
            Some(default) => Ok(Some(default.to_value())),
            None if param.required => Err(missing(spec, param)),
            None => Ok(None),
        },
    }
}

fn missing(spec: &ToolSpec, param: &ParamSpec) -> DispatchError {
    DispatchError::MissingArgument {
        tool: spec.name.to_string(),
        argument: param.name.to_string(),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Executes tools against Airflow under the configured access level.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: Arc<ClientConfig>,
}

impl Dispatcher {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self { config }
    }

    /// Find the tool and check the access gate. Never touches the network.
    pub fn authorize(&self, name: &str) -> Result<&'static ToolSpec, DispatchError> {
        let spec = registry::find(name).ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;
        if spec.is_write() && !self.config.access_level().allows_writes() {
            return Err(DispatchError::PermissionDenied(name.to_string()));
        }
        Ok(spec)
    }

    /// Run one tool and return the decoded Airflow response.
    pub async fn execute(&self, name: &str, arguments: &Value) -> Result<Value, DispatchError> {
        let spec = self.authorize(name)?;

        let empty = Map::new();
        let arguments = arguments.as_object().unwrap_or(&empty);
        let call = UpstreamCall::plan(spec, arguments)?;
        debug!(tool = name, method = %call.method, path = %call.path(), "dispatching tool");

        // One client per call, released when this scope ends on any path.
        let client = AirflowClient::new(self.config.clone())?;
        let result = client
            .request(call.method, &call.segments, &call.query, call.body.as_ref())
            .await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airflow_sdk::AccessLevel;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dispatcher(base_url: &str, access_level: AccessLevel) -> Dispatcher {
        let config = ClientConfig::builder()
            .base_url(base_url)
            .username("airflow")
            .password("airflow")
            .access_level(access_level)
            .build()
            .unwrap();
        Dispatcher::new(Arc::new(config))
    }

    fn plan(name: &str, arguments: Value) -> Result<UpstreamCall, DispatchError> {
        let spec = registry::find(name).unwrap();
        UpstreamCall::plan(spec, arguments.as_object().unwrap())
    }

    #[test]
    fn test_plan_applies_query_defaults() {
        let call = plan("list_dags", json!({"limit": 5})).unwrap();
        assert_eq!(call.method, Method::GET);
        assert_eq!(call.path(), "/dags");
        assert_eq!(
            call.query,
            vec![
                ("limit".to_string(), "5".to_string()),
                ("offset".to_string(), "0".to_string())
            ]
        );
        assert_eq!(call.body, None);
    }

    #[test]
    fn test_plan_substitutes_path_and_default_try_number() {
        let call = plan(
            "get_task_logs",
            json!({"dag_id": "etl", "dag_run_id": "manual__1", "task_id": "extract"}),
        )
        .unwrap();
        assert_eq!(
            call.path(),
            "/dags/etl/dagRuns/manual__1/taskInstances/extract/logs/1"
        );
        assert!(call.query.is_empty());
    }

    #[test]
    fn test_plan_missing_required_argument() {
        match plan("get_dag", json!({})) {
            Err(DispatchError::MissingArgument { tool, argument }) => {
                assert_eq!(tool, "get_dag");
                assert_eq!(argument, "dag_id");
            }
            other => panic!("Expected MissingArgument, got {:?}", other),
        }

        assert!(matches!(
            plan("get_dag", json!({"dag_id": ""})),
            Err(DispatchError::MissingArgument { .. })
        ));
        assert!(matches!(
            plan("set_variable", json!({"key": "k"})),
            Err(DispatchError::MissingArgument { .. })
        ));
    }

    #[test]
    fn test_plan_bodies() {
        let call = plan("pause_dag", json!({"dag_id": "etl"})).unwrap();
        assert_eq!(call.method, Method::PATCH);
        assert_eq!(call.body, Some(json!({"is_paused": true})));

        let call = plan("trigger_dag", json!({"dag_id": "etl"})).unwrap();
        assert_eq!(call.path(), "/dags/etl/dagRuns");
        assert_eq!(call.body, Some(json!({})));

        let call = plan("trigger_dag", json!({"dag_id": "etl", "conf": {}})).unwrap();
        assert_eq!(call.body, Some(json!({})));

        let call = plan("trigger_dag", json!({"dag_id": "etl", "conf": {"date": "2024-01-01"}})).unwrap();
        assert_eq!(call.body, Some(json!({"conf": {"date": "2024-01-01"}})));

        let call = plan("set_variable", json!({"key": "env", "value": "prod"})).unwrap();
        assert_eq!(
            call.body,
            Some(json!({"key": "env", "value": "prod", "description": ""}))
        );
    }

    #[test]
    fn test_plan_keeps_slash_inside_id() {
        let call = plan("get_variable", json!({"key": "team/env"})).unwrap();
        assert_eq!(call.segments, vec!["variables".to_string(), "team/env".to_string()]);

        let call = plan(
            "get_task_instances",
            json!({"dag_id": "etl", "dag_run_id": "manual__2024/01"}),
        )
        .unwrap();
        assert_eq!(
            call.segments,
            vec!["dags", "etl", "dagRuns", "manual__2024/01", "taskInstances"]
        );
    }

    #[test]
    fn test_authorize() {
        let read_only = dispatcher("http://localhost:8080", AccessLevel::ReadOnly);
        assert!(read_only.authorize("list_dags").is_ok());
        assert!(matches!(
            read_only.authorize("trigger_dag"),
            Err(DispatchError::PermissionDenied(_))
        ));
        assert!(matches!(
            read_only.authorize("drop_everything"),
            Err(DispatchError::UnknownTool(_))
        ));

        let full = dispatcher("http://localhost:8080", AccessLevel::Full);
        assert!(full.authorize("trigger_dag").is_ok());
    }

    #[tokio::test]
    async fn test_execute_list_dags() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/dags"))
            .and(query_param("limit", "5"))
            .and(query_param("offset", "0"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"dags": [{"dag_id": "etl"}], "total_entries": 1})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server.uri(), AccessLevel::Full);
        let result = dispatcher.execute("list_dags", &json!({"limit": 5})).await.unwrap();
        assert_eq!(result["total_entries"], 1);
    }

    #[tokio::test]
    async fn test_write_denied_without_upstream_call() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server.uri(), AccessLevel::ReadOnly);
        let err = dispatcher
            .execute("trigger_dag", &json!({"dag_id": "x"}))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::PermissionDenied(_)));
        assert!(err.to_string().contains("not permitted in read-only mode"));
    }

    #[tokio::test]
    async fn test_execute_set_variable() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/variables"))
            .and(body_json(json!({"key": "env", "value": "prod", "description": "stage"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "env", "value": "prod"})))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server.uri(), AccessLevel::Full);
        let result = dispatcher
            .execute(
                "set_variable",
                &json!({"key": "env", "value": "prod", "description": "stage"}),
            )
            .await
            .unwrap();
        assert_eq!(result["value"], "prod");
    }

    #[tokio::test]
    async fn test_execute_encodes_slash_in_variable_key() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/v1/variables/team%2Fenv"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server.uri(), AccessLevel::Full);
        let result = dispatcher
            .execute("delete_variable", &json!({"key": "team/env"}))
            .await
            .unwrap();
        assert_eq!(result, Value::Null);
    }

    #[tokio::test]
    async fn test_execute_trigger_with_empty_conf() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/dags/etl/dagRuns"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"dag_run_id": "manual__1"})))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server.uri(), AccessLevel::Full);
        let result = dispatcher
            .execute("trigger_dag", &json!({"dag_id": "etl", "conf": {}}))
            .await
            .unwrap();
        assert_eq!(result["dag_run_id"], "manual__1");
    }

    #[tokio::test]
    async fn test_execute_null_arguments() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"scheduler": {"status": "healthy"}})))
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server.uri(), AccessLevel::ReadOnly);
        let result = dispatcher.execute("get_health", &Value::Null).await.unwrap();
        assert_eq!(result["scheduler"]["status"], "healthy");
    }

    #[tokio::test]
    async fn test_execute_upstream_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/dags/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("DAG not found"))
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server.uri(), AccessLevel::ReadOnly);
        let err = dispatcher
            .execute("get_dag", &json!({"dag_id": "missing"}))
            .await
            .unwrap_err();

        match err {
            DispatchError::Upstream(AirflowError::Upstream { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected upstream error, got {:?}", other),
        }
    }
}
