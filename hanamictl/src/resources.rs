//! Resource helpers for the Hanami control API.
//!
//! Each helper picks a verb, path, query and body, then goes through the same
//! authenticated dispatch as the raw verb methods, so token handling and the
//! `(success, body)` contract are identical.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hanami_core::api::{
    paths, task_create_path, CheckDataSetRequest, CreateClusterRequest, CreateProjectRequest,
    CreateTaskRequest, CreateUserRequest, GenerateTemplateRequest, RestoreClusterRequest,
    SaveClusterRequest, SetClusterModeRequest, TaskInput, TaskKind, UploadTemplateRequest,
};
use hanami_core::{Outcome, Query};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::client::AuthenticatedClient;
use crate::transport::Transport;

impl<T: Transport> AuthenticatedClient<T> {
    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Outcome {
        match serde_json::to_string(body) {
            Ok(json) => self.post(path, &Query::new(), &json).await,
            Err(e) => {
                warn!("failed to serialize request body for {}: {}", path, e);
                Outcome::failure()
            }
        }
    }

    async fn put_json<B: Serialize>(&self, path: &str, body: &B) -> Outcome {
        match serde_json::to_string(body) {
            Ok(json) => self.put(path, &Query::new(), &json).await,
            Err(e) => {
                warn!("failed to serialize request body for {}: {}", path, e);
                Outcome::failure()
            }
        }
    }

    // Users

    /// Create a user
    pub async fn create_user(
        &self,
        id: &str,
        name: &str,
        password: &str,
        is_admin: bool,
    ) -> Outcome {
        let body = CreateUserRequest {
            id: id.to_string(),
            name: name.to_string(),
            password: password.to_string(),
            is_admin,
        };
        self.post_json(paths::USER, &body).await
    }

    /// Get a user by id
    pub async fn get_user(&self, id: &str) -> Outcome {
        self.get(paths::USER, &Query::new().param("id", id)).await
    }

    /// List all users
    pub async fn list_users(&self) -> Outcome {
        self.get(paths::USER_ALL, &Query::new()).await
    }

    /// Delete a user by id
    pub async fn delete_user(&self, id: &str) -> Outcome {
        self.delete(paths::USER, &Query::new().param("id", id)).await
    }

    // Projects

    pub async fn create_project(&self, name: &str) -> Outcome {
        let body = CreateProjectRequest {
            name: name.to_string(),
        };
        self.post_json(paths::PROJECT, &body).await
    }

    pub async fn get_project(&self, name: &str) -> Outcome {
        self.get(paths::PROJECT, &Query::new().param("name", name))
            .await
    }

    pub async fn list_projects(&self) -> Outcome {
        self.get(paths::PROJECT_ALL, &Query::new()).await
    }

    pub async fn delete_project(&self, name: &str) -> Outcome {
        self.delete(paths::PROJECT, &Query::new().param("name", name))
            .await
    }

    // Clusters

    /// Create a cluster from a template.
    ///
    /// `template` is the raw template text; it is base64-encoded before being
    /// sent.
    pub async fn create_cluster(&self, name: &str, template: &str) -> Outcome {
        let body = CreateClusterRequest {
            name: name.to_string(),
            template: STANDARD.encode(template),
        };
        self.post_json(paths::CLUSTER, &body).await
    }

    pub async fn get_cluster(&self, uuid: &str) -> Outcome {
        self.get(paths::CLUSTER, &Query::new().param("uuid", uuid))
            .await
    }

    pub async fn list_clusters(&self) -> Outcome {
        self.get(paths::CLUSTER_ALL, &Query::new()).await
    }

    pub async fn delete_cluster(&self, uuid: &str) -> Outcome {
        self.delete(paths::CLUSTER, &Query::new().param("uuid", uuid))
            .await
    }

    /// Save a snapshot of a cluster under `name`
    pub async fn save_cluster(&self, name: &str, cluster_uuid: &str) -> Outcome {
        let body = SaveClusterRequest {
            name: name.to_string(),
            cluster_uuid: cluster_uuid.to_string(),
        };
        self.post_json(paths::CLUSTER_SAVE, &body).await
    }

    /// Restore a cluster from a snapshot
    pub async fn restore_cluster(&self, snapshot_uuid: &str, cluster_uuid: &str) -> Outcome {
        let body = RestoreClusterRequest {
            snapshot_uuid: snapshot_uuid.to_string(),
            cluster_uuid: cluster_uuid.to_string(),
        };
        self.post_json(paths::CLUSTER_LOAD, &body).await
    }

    /// Switch a cluster to task mode.
    ///
    /// Direct mode needs a websocket session and is not offered here.
    pub async fn set_cluster_task_mode(&self, uuid: &str) -> Outcome {
        let body = SetClusterModeRequest {
            new_state: "TASK".to_string(),
            uuid: uuid.to_string(),
        };
        self.put_json(paths::CLUSTER_SET_MODE, &body).await
    }

    // Cluster snapshots

    pub async fn get_snapshot(&self, uuid: &str) -> Outcome {
        self.get(paths::CLUSTER_SNAPSHOT, &Query::new().param("uuid", uuid))
            .await
    }

    pub async fn list_snapshots(&self) -> Outcome {
        self.get(paths::CLUSTER_SNAPSHOT_ALL, &Query::new()).await
    }

    pub async fn delete_snapshot(&self, uuid: &str) -> Outcome {
        self.delete(paths::CLUSTER_SNAPSHOT, &Query::new().param("uuid", uuid))
            .await
    }

    // Templates

    /// Generate a template of type `kind` sized for a data set
    pub async fn generate_template(&self, name: &str, kind: &str, data_set_uuid: &str) -> Outcome {
        let body = GenerateTemplateRequest {
            name: name.to_string(),
            kind: kind.to_string(),
            data_set_uuid: data_set_uuid.to_string(),
        };
        self.post_json(paths::TEMPLATE_GENERATE, &body).await
    }

    /// Upload a template; it is embedded in the body as JSON, not encoded.
    pub async fn upload_template(&self, name: &str, template: &Value) -> Outcome {
        let body = UploadTemplateRequest {
            name: name.to_string(),
            template: template.clone(),
        };
        self.post_json(paths::TEMPLATE_UPLOAD, &body).await
    }

    pub async fn get_template(&self, uuid: &str) -> Outcome {
        self.get(paths::TEMPLATE, &Query::new().param("uuid", uuid))
            .await
    }

    pub async fn list_templates(&self) -> Outcome {
        self.get(paths::TEMPLATE_ALL, &Query::new()).await
    }

    pub async fn delete_template(&self, uuid: &str) -> Outcome {
        self.delete(paths::TEMPLATE, &Query::new().param("uuid", uuid))
            .await
    }

    // Tasks

    /// Start a learn or request task on images from a data set
    pub async fn create_image_task(
        &self,
        kind: TaskKind,
        name: &str,
        cluster_uuid: &str,
        data_set_uuid: &str,
    ) -> Outcome {
        let body = CreateTaskRequest {
            name: name.to_string(),
            cluster_uuid: cluster_uuid.to_string(),
            data_set_uuid: data_set_uuid.to_string(),
            column_name: None,
        };
        self.post_json(task_create_path(TaskInput::Image, kind), &body)
            .await
    }

    /// Start a learn or request task on one column of a graph data set
    pub async fn create_graph_task(
        &self,
        kind: TaskKind,
        name: &str,
        cluster_uuid: &str,
        data_set_uuid: &str,
        column_name: &str,
    ) -> Outcome {
        let body = CreateTaskRequest {
            name: name.to_string(),
            cluster_uuid: cluster_uuid.to_string(),
            data_set_uuid: data_set_uuid.to_string(),
            column_name: Some(column_name.to_string()),
        };
        self.post_json(task_create_path(TaskInput::Graph, kind), &body)
            .await
    }

    pub async fn get_task(&self, uuid: &str, cluster_uuid: &str) -> Outcome {
        let query = Query::new()
            .param("uuid", uuid)
            .param("cluster_uuid", cluster_uuid);
        self.get(paths::TASK, &query).await
    }

    /// List the tasks of one cluster
    pub async fn list_tasks(&self, cluster_uuid: &str) -> Outcome {
        self.get(paths::TASK_ALL, &Query::new().param("cluster_uuid", cluster_uuid))
            .await
    }

    pub async fn delete_task(&self, uuid: &str, cluster_uuid: &str) -> Outcome {
        let query = Query::new()
            .param("uuid", uuid)
            .param("cluster_uuid", cluster_uuid);
        self.delete(paths::TASK, &query).await
    }

    // Data sets

    pub async fn get_data_set(&self, uuid: &str) -> Outcome {
        self.get(paths::DATA_SET, &Query::new().param("uuid", uuid))
            .await
    }

    pub async fn list_data_sets(&self) -> Outcome {
        self.get(paths::DATA_SET_ALL, &Query::new()).await
    }

    pub async fn delete_data_set(&self, uuid: &str) -> Outcome {
        self.delete(paths::DATA_SET, &Query::new().param("uuid", uuid))
            .await
    }

    /// Upload progress of a data set
    pub async fn data_set_progress(&self, uuid: &str) -> Outcome {
        self.get(paths::DATA_SET_PROGRESS, &Query::new().param("uuid", uuid))
            .await
    }

    /// Compare the output of a request task with a data set
    pub async fn check_data_set(&self, data_set_uuid: &str, result_uuid: &str) -> Outcome {
        let body = CheckDataSetRequest {
            data_set_uuid: data_set_uuid.to_string(),
            result_uuid: result_uuid.to_string(),
        };
        self.post_json(paths::DATA_SET_CHECK, &body).await
    }
}
