// MCP tool catalog: one declarative entry per Airflow operation

use crate::protocol::ToolSchema;
use airflow_sdk::{AccessLevel, Method};
use serde_json::{json, Map, Value};

/// Whether a tool mutates Airflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolAccess {
    Read,
    Write,
}

/// HTTP verb of the upstream call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Patch,
    Delete,
}

impl From<Verb> for Method {
    fn from(verb: Verb) -> Self {
        match verb {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
        }
    }
}

/// Where an argument ends up in the upstream request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    /// Substituted into `{name}` in the path template
    Path,
    Query,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Object,
}

impl ParamKind {
    fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Object => "object",
        }
    }
}

/// Literal default applied when an optional argument is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Int(i64),
    Str(&'static str),
    Bool(bool),
}

impl Literal {
    pub fn to_value(self) -> Value {
        match self {
            Self::Int(n) => json!(n),
            Self::Str(s) => json!(s),
            Self::Bool(b) => json!(b),
        }
    }
}

/// One tool argument
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub location: ParamLocation,
    pub required: bool,
    pub default: Option<Literal>,
}

/// Full description of a tool: what it advertises and how it maps upstream.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub access: ToolAccess,
    pub verb: Verb,
    pub path: &'static str,
    pub params: &'static [ParamSpec],
    /// Body fields that do not come from arguments
    pub fixed_body: &'static [(&'static str, Literal)],
}

impl ToolSpec {
    /// Descriptor advertised through `tools/list`.
    pub fn schema(&self) -> ToolSchema {
        let mut properties = Map::new();
        for param in self.params {
            let mut property = json!({
                "type": param.kind.json_type(),
                "description": param.description,
            });
            if let Some(default) = param.default {
                property["default"] = default.to_value();
            }
            properties.insert(param.name.to_string(), property);
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        ToolSchema {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: json_schema_object(Value::Object(properties), required),
        }
    }

    pub fn is_write(&self) -> bool {
        self.access == ToolAccess::Write
    }
}

const fn path_param(name: &'static str, description: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        kind: ParamKind::String,
        description,
        location: ParamLocation::Path,
        required: true,
        default: None,
    }
}

const fn page_param(name: &'static str, description: &'static str, default: i64) -> ParamSpec {
    ParamSpec {
        name,
        kind: ParamKind::Integer,
        description,
        location: ParamLocation::Query,
        required: false,
        default: Some(Literal::Int(default)),
    }
}

const DAG_ID: ParamSpec = path_param("dag_id", "The DAG ID");
const DAG_RUN_ID: ParamSpec = path_param("dag_run_id", "The DAG run ID");
const VARIABLE_KEY: ParamSpec = path_param("key", "The variable key");

/// Every tool, read set first. Order is the order advertised by `tools/list`.
pub static CATALOG: &[ToolSpec] = &[
    ToolSpec {
        name: "list_dags",
        description: "List all DAGs in Airflow",
        access: ToolAccess::Read,
        verb: Verb::Get,
        path: "/dags",
        params: &[
            page_param("limit", "Number of DAGs to return", 100),
            page_param("offset", "Number of DAGs to skip", 0),
        ],
        fixed_body: &[],
    },
    ToolSpec {
        name: "get_dag",
        description: "Get details of a specific DAG",
        access: ToolAccess::Read,
        verb: Verb::Get,
        path: "/dags/{dag_id}",
        params: &[DAG_ID],
        fixed_body: &[],
    },
    ToolSpec {
        name: "get_dag_runs",
        description: "Get DAG runs for a specific DAG",
        access: ToolAccess::Read,
        verb: Verb::Get,
        path: "/dags/{dag_id}/dagRuns",
        params: &[
            DAG_ID,
            page_param("limit", "Number of DAG runs to return", 100),
            page_param("offset", "Number of DAG runs to skip", 0),
        ],
        fixed_body: &[],
    },
    ToolSpec {
        name: "get_task_instances",
        description: "Get task instances for a specific DAG run",
        access: ToolAccess::Read,
        verb: Verb::Get,
        path: "/dags/{dag_id}/dagRuns/{dag_run_id}/taskInstances",
        params: &[
            DAG_ID,
            DAG_RUN_ID,
            page_param("limit", "Number of task instances to return", 100),
            page_param("offset", "Number of task instances to skip", 0),
        ],
        fixed_body: &[],
    },
    ToolSpec {
        name: "get_task_logs",
        description: "Get logs for a specific task instance",
        access: ToolAccess::Read,
        verb: Verb::Get,
        path: "/dags/{dag_id}/dagRuns/{dag_run_id}/taskInstances/{task_id}/logs/{task_try_number}",
        params: &[
            DAG_ID,
            DAG_RUN_ID,
            path_param("task_id", "The task ID"),
            ParamSpec {
                name: "task_try_number",
                kind: ParamKind::Integer,
                description: "The task try number",
                location: ParamLocation::Path,
                required: false,
                default: Some(Literal::Int(1)),
            },
        ],
        fixed_body: &[],
    },
    ToolSpec {
        name: "get_variables",
        description: "Get Airflow variables",
        access: ToolAccess::Read,
        verb: Verb::Get,
        path: "/variables",
        params: &[
            page_param("limit", "Number of variables to return", 100),
            page_param("offset", "Number of variables to skip", 0),
        ],
        fixed_body: &[],
    },
    ToolSpec {
        name: "get_variable",
        description: "Get a specific Airflow variable",
        access: ToolAccess::Read,
        verb: Verb::Get,
        path: "/variables/{key}",
        params: &[VARIABLE_KEY],
        fixed_body: &[],
    },
    ToolSpec {
        name: "get_connections",
        description: "Get Airflow connections",
        access: ToolAccess::Read,
        verb: Verb::Get,
        path: "/connections",
        params: &[
            page_param("limit", "Number of connections to return", 100),
            page_param("offset", "Number of connections to skip", 0),
        ],
        fixed_body: &[],
    },
    ToolSpec {
        name: "get_health",
        description: "Get Airflow health status",
        access: ToolAccess::Read,
        verb: Verb::Get,
        path: "/health",
        params: &[],
        fixed_body: &[],
    },
    ToolSpec {
        name: "trigger_dag",
        description: "Trigger a DAG run",
        access: ToolAccess::Write,
        verb: Verb::Post,
        path: "/dags/{dag_id}/dagRuns",
        params: &[
            DAG_ID,
            ParamSpec {
                name: "conf",
                kind: ParamKind::Object,
                description: "Configuration for the DAG run",
                location: ParamLocation::Body,
                required: false,
                default: None,
            },
        ],
        fixed_body: &[],
    },
    ToolSpec {
        name: "pause_dag",
        description: "Pause a DAG",
        access: ToolAccess::Write,
        verb: Verb::Patch,
        path: "/dags/{dag_id}",
        params: &[DAG_ID],
        fixed_body: &[("is_paused", Literal::Bool(true))],
    },
    ToolSpec {
        name: "unpause_dag",
        description: "Unpause a DAG",
        access: ToolAccess::Write,
        verb: Verb::Patch,
        path: "/dags/{dag_id}",
        params: &[DAG_ID],
        fixed_body: &[("is_paused", Literal::Bool(false))],
    },
    ToolSpec {
        name: "set_variable",
        description: "Set an Airflow variable",
        access: ToolAccess::Write,
        verb: Verb::Post,
        path: "/variables",
        params: &[
            ParamSpec {
                name: "key",
                kind: ParamKind::String,
                description: "The variable key",
                location: ParamLocation::Body,
                required: true,
                default: None,
            },
            ParamSpec {
                name: "value",
                kind: ParamKind::String,
                description: "The variable value",
                location: ParamLocation::Body,
                required: true,
                default: None,
            },
            ParamSpec {
                name: "description",
                kind: ParamKind::String,
                description: "Variable description",
                location: ParamLocation::Body,
                required: false,
                default: Some(Literal::Str("")),
            },
        ],
        fixed_body: &[],
    },
    ToolSpec {
        name: "delete_variable",
        description: "Delete an Airflow variable",
        access: ToolAccess::Write,
        verb: Verb::Delete,
        path: "/variables/{key}",
        params: &[VARIABLE_KEY],
        fixed_body: &[],
    },
];

/// Look a tool up by name, regardless of access level.
pub fn find(name: &str) -> Option<&'static ToolSpec> {
    CATALOG.iter().find(|spec| spec.name == name)
}

/// Tools exposed at the given access level, in catalog order.
pub fn descriptors(access_level: AccessLevel) -> Vec<ToolSchema> {
    CATALOG
        .iter()
        .filter(|spec| !spec.is_write() || access_level.allows_writes())
        .map(ToolSpec::schema)
        .collect()
}

/// Tool descriptors computed once for the process' access level.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    access_level: AccessLevel,
    schemas: Vec<ToolSchema>,
}

impl ToolRegistry {
    pub fn new(access_level: AccessLevel) -> Self {
        Self {
            access_level,
            schemas: descriptors(access_level),
        }
    }

    pub fn access_level(&self) -> AccessLevel {
        self.access_level
    }

    /// List all exposed tool schemas
    pub fn list_schemas(&self) -> &[ToolSchema] {
        &self.schemas
    }

    /// Check if a tool is exposed
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.iter().any(|schema| schema.name == name)
    }
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    if required.is_empty() {
        json!({
            "type": "object",
            "properties": properties
        })
    } else {
        json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }
}
