//! Wire models for the Hanami control API
//!
//! Request bodies sent by the resource helpers and the token response parsed
//! during authentication.

use serde::{Deserialize, Serialize};

/// Body text the server returns when a previously valid token has expired.
pub const EXPIRED_TOKEN_SENTINEL: &str = "Token is expired";

/// Service that issues tokens when none is configured
pub const DEFAULT_AUTH_SERVICE: &str = "misaka";

/// Resource paths used by the helpers in `hanamictl`
pub mod paths {
    pub const USER: &str = "control/misaki/v1/user";
    pub const USER_ALL: &str = "control/misaki/v1/user/all";
    pub const PROJECT: &str = "control/misaki/v1/project";
    pub const PROJECT_ALL: &str = "control/misaki/v1/project/all";
    pub const CLUSTER: &str = "control/kyouko/v1/cluster";
    pub const CLUSTER_ALL: &str = "control/kyouko/v1/cluster/all";
    pub const CLUSTER_SAVE: &str = "control/kyouko/v1/cluster/save";
    pub const CLUSTER_LOAD: &str = "control/kyouko/v1/cluster/load";
    pub const CLUSTER_SET_MODE: &str = "control/kyouko/v1/cluster/set_mode";
    pub const CLUSTER_SNAPSHOT: &str = "control/sagiri/v1/cluster_snapshot";
    pub const CLUSTER_SNAPSHOT_ALL: &str = "control/sagiri/v1/cluster_snapshot/all";
    pub const TEMPLATE: &str = "control/kyouko/v1/template";
    pub const TEMPLATE_ALL: &str = "control/kyouko/v1/template/all";
    pub const TEMPLATE_GENERATE: &str = "control/kyouko/v1/template/generate";
    pub const TEMPLATE_UPLOAD: &str = "control/kyouko/v1/template/upload";
    pub const TASK: &str = "control/kyouko/v1/task";
    pub const TASK_ALL: &str = "control/kyouko/v1/task/all";
    pub const TASK_IMAGE_LEARN: &str = "control/kyouko/v1/task/image/learn";
    pub const TASK_IMAGE_REQUEST: &str = "control/kyouko/v1/task/image/request";
    pub const TASK_GRAPH_LEARN: &str = "control/kyouko/v1/task/graph/learn";
    pub const TASK_GRAPH_REQUEST: &str = "control/kyouko/v1/task/graph/request";
    pub const DATA_SET: &str = "control/sagiri/v1/data_set";
    pub const DATA_SET_ALL: &str = "control/sagiri/v1/data_set/all";
    pub const DATA_SET_PROGRESS: &str = "control/sagiri/v1/data_set/progress";
    pub const DATA_SET_CHECK: &str = "control/sagiri/v1/data_set/check";

    /// Login path for `service`, e.g. `control/misaka/token`.
    pub fn token(service: &str) -> String {
        format!("control/{}/token", service.trim_matches('/'))
    }
}

/// Response of the login endpoint.
///
/// Only `token` is read; any other fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<serde_json::Value>,
}

impl TokenResponse {
    /// The token, if present as a non-empty string.
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .filter(|t| !t.is_empty())
    }
}

/// Body for creating a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub id: String,
    pub name: String,
    pub password: String,
    pub is_admin: bool,
}

/// Body for creating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

/// Body for creating a cluster from a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClusterRequest {
    pub name: String,
    /// Base64-encoded cluster template
    pub template: String,
}

/// Body for saving a cluster snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveClusterRequest {
    pub name: String,
    pub cluster_uuid: String,
}

/// Body for restoring a cluster from a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreClusterRequest {
    pub snapshot_uuid: String,
    pub cluster_uuid: String,
}

/// Body for switching a cluster to task mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetClusterModeRequest {
    pub new_state: String,
    pub uuid: String,
}

/// Body for generating a template from a data set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateTemplateRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data_set_uuid: String,
}

/// Body for uploading a template; `template` is sent as inline JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTemplateRequest {
    pub name: String,
    pub template: serde_json::Value,
}

/// Kind of input a task runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskInput {
    Image,
    Graph,
}

/// What a task does with its input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Learn,
    Request,
}

/// Path that creates a task of the given input and kind
pub fn task_create_path(input: TaskInput, kind: TaskKind) -> &'static str {
    match (input, kind) {
        (TaskInput::Image, TaskKind::Learn) => paths::TASK_IMAGE_LEARN,
        (TaskInput::Image, TaskKind::Request) => paths::TASK_IMAGE_REQUEST,
        (TaskInput::Graph, TaskKind::Learn) => paths::TASK_GRAPH_LEARN,
        (TaskInput::Graph, TaskKind::Request) => paths::TASK_GRAPH_REQUEST,
    }
}

/// Body for creating a task.
///
/// Graph tasks name the data set column to use; image tasks leave it out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,
    pub cluster_uuid: String,
    pub data_set_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
}

/// Body for checking a result set against a data set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckDataSetRequest {
    pub data_set_uuid: String,
    pub result_uuid: String,
}
