//! Test utilities for CLI testing
//!
//! Provides a mock control server that issues and expires tokens, and a
//! scripted transport for exact wire-level assertions.

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use hanami_core::api::{CreateProjectRequest, CreateUserRequest, EXPIRED_TOKEN_SENTINEL};
use hanami_core::HanamiError;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use crate::transport::{RawResponse, Transport, WireRequest};

pub const MOCK_USER: &str = "alice";
pub const MOCK_PASSWORD: &str = "pw1";

type Params = Query<HashMap<String, String>>;
type Reply = (StatusCode, String);

/// Mock server state
#[derive(Debug, Clone, Default)]
pub struct MockServerState {
    /// Number of tokens issued so far
    issued: Arc<Mutex<u32>>,
    /// Tokens currently accepted
    valid: Arc<Mutex<HashSet<String>>>,
    /// Tokens that were valid once
    expired: Arc<Mutex<HashSet<String>>>,
    /// Requests that reached a resource handler with a valid token
    served: Arc<Mutex<u32>>,
    /// Users by id
    users: Arc<Mutex<BTreeMap<String, serde_json::Value>>>,
    /// Projects by name
    projects: Arc<Mutex<BTreeMap<String, serde_json::Value>>>,
}

impl MockServerState {
    /// Number of successful logins
    pub fn logins(&self) -> u32 {
        *self.issued.lock().unwrap()
    }

    /// Number of authorised resource requests
    pub fn requests(&self) -> u32 {
        *self.served.lock().unwrap()
    }

    /// Expire every token issued so far
    pub fn expire_all_tokens(&self) {
        let mut valid = self.valid.lock().unwrap();
        self.expired.lock().unwrap().extend(valid.drain());
    }

    fn issue_token(&self) -> String {
        let mut issued = self.issued.lock().unwrap();
        *issued += 1;
        let token = format!("T{}", *issued);
        self.valid.lock().unwrap().insert(token.clone());
        token
    }

    /// Check the `token` parameter, returning the reply to send if it is
    /// not acceptable.
    fn authorise(&self, params: &HashMap<String, String>) -> std::result::Result<(), Reply> {
        let token = params.get("token").map(String::as_str).unwrap_or_default();
        if self.valid.lock().unwrap().contains(token) {
            *self.served.lock().unwrap() += 1;
            Ok(())
        } else if self.expired.lock().unwrap().contains(token) {
            Err((StatusCode::UNAUTHORIZED, EXPIRED_TOKEN_SENTINEL.to_string()))
        } else {
            Err((StatusCode::UNAUTHORIZED, "invalid token".to_string()))
        }
    }
}

/// Mock server implementation
#[derive(Debug)]
pub struct MockServer {
    state: MockServerState,
    port: u16,
}

impl Default for MockServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockServer {
    /// Create a new mock server
    pub fn new() -> Self {
        Self {
            state: MockServerState::default(),
            port: 0, // Will be assigned when server starts
        }
    }

    /// Start the mock server and return the address
    pub async fn start(mut self) -> Result<(Self, String)> {
        let app = self.create_router();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        self.port = listener.local_addr()?.port();

        let server_url = "http://127.0.0.1".to_string();

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Mock server error: {}", e);
            }
        });

        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if tokio::net::TcpStream::connect(("127.0.0.1", self.port))
                .await
                .is_ok()
            {
                break;
            }
        }

        Ok((self, server_url))
    }

    /// Get the server port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the server state
    pub fn state(&self) -> &MockServerState {
        &self.state
    }

    fn create_router(&self) -> Router {
        Router::new()
            .route("/control/misaka/token", get(token_handler))
            .route(
                "/control/misaki/v1/user",
                get(get_user_handler)
                    .post(create_user_handler)
                    .delete(delete_user_handler),
            )
            .route("/control/misaki/v1/user/all", get(list_users_handler))
            .route(
                "/control/misaki/v1/project",
                get(get_project_handler)
                    .post(create_project_handler)
                    .delete(delete_project_handler),
            )
            .route("/control/misaki/v1/project/all", get(list_projects_handler))
            .with_state(self.state.clone())
    }
}

// Handler functions

async fn token_handler(State(state): State<MockServerState>, Query(params): Params) -> Reply {
    let user = params.get("user_name").map(String::as_str);
    let pw = params.get("pw").map(String::as_str);
    if user != Some(MOCK_USER) || pw != Some(MOCK_PASSWORD) {
        return (StatusCode::UNAUTHORIZED, "wrong user name or password".into());
    }
    let token = state.issue_token();
    (StatusCode::OK, serde_json::json!({ "token": token }).to_string())
}

fn list(map: &Mutex<BTreeMap<String, serde_json::Value>>) -> Reply {
    let values: Vec<_> = map.lock().unwrap().values().cloned().collect();
    (StatusCode::OK, serde_json::Value::Array(values).to_string())
}

fn lookup(map: &Mutex<BTreeMap<String, serde_json::Value>>, key: Option<&String>) -> Reply {
    match key.and_then(|k| map.lock().unwrap().get(k).cloned()) {
        Some(value) => (StatusCode::OK, value.to_string()),
        None => (StatusCode::NOT_FOUND, "not found".into()),
    }
}

fn remove(map: &Mutex<BTreeMap<String, serde_json::Value>>, key: Option<&String>) -> Reply {
    match key.and_then(|k| map.lock().unwrap().remove(k)) {
        Some(value) => (StatusCode::OK, value.to_string()),
        None => (StatusCode::NOT_FOUND, "not found".into()),
    }
}

async fn list_users_handler(State(state): State<MockServerState>, Query(params): Params) -> Reply {
    if let Err(reply) = state.authorise(&params) {
        return reply;
    }
    list(&state.users)
}

async fn get_user_handler(State(state): State<MockServerState>, Query(params): Params) -> Reply {
    if let Err(reply) = state.authorise(&params) {
        return reply;
    }
    lookup(&state.users, params.get("id"))
}

async fn delete_user_handler(
    State(state): State<MockServerState>,
    Query(params): Params,
) -> Reply {
    if let Err(reply) = state.authorise(&params) {
        return reply;
    }
    remove(&state.users, params.get("id"))
}

async fn create_user_handler(
    State(state): State<MockServerState>,
    Query(params): Params,
    Json(req): Json<CreateUserRequest>,
) -> Reply {
    if let Err(reply) = state.authorise(&params) {
        return reply;
    }
    let user = serde_json::json!({ "id": req.id, "name": req.name, "is_admin": req.is_admin });
    let mut users = state.users.lock().unwrap();
    if users.contains_key(&req.id) {
        return (StatusCode::CONFLICT, "user already exists".into());
    }
    users.insert(req.id, user.clone());
    (StatusCode::OK, user.to_string())
}

async fn list_projects_handler(
    State(state): State<MockServerState>,
    Query(params): Params,
) -> Reply {
    if let Err(reply) = state.authorise(&params) {
        return reply;
    }
    list(&state.projects)
}

async fn get_project_handler(
    State(state): State<MockServerState>,
    Query(params): Params,
) -> Reply {
    if let Err(reply) = state.authorise(&params) {
        return reply;
    }
    lookup(&state.projects, params.get("name"))
}

async fn delete_project_handler(
    State(state): State<MockServerState>,
    Query(params): Params,
) -> Reply {
    if let Err(reply) = state.authorise(&params) {
        return reply;
    }
    remove(&state.projects, params.get("name"))
}

async fn create_project_handler(
    State(state): State<MockServerState>,
    Query(params): Params,
    Json(req): Json<CreateProjectRequest>,
) -> Reply {
    if let Err(reply) = state.authorise(&params) {
        return reply;
    }
    let project = serde_json::json!({ "name": req.name });
    state
        .projects
        .lock()
        .unwrap()
        .insert(req.name, project.clone());
    (StatusCode::OK, project.to_string())
}

/// Transport that replays queued responses and records every request.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<hanami_core::Result<RawResponse>>>>,
    sent: Arc<Mutex<Vec<WireRequest>>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<hanami_core::Result<RawResponse>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            sent: Arc::default(),
        }
    }

    /// Requests sent so far, as `VERB /path?query`
    pub fn targets(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|r| match r.url.query() {
                Some(q) => format!("{} {}?{}", r.verb, r.url.path(), q),
                None => format!("{} {}", r.verb, r.url.path()),
            })
            .collect()
    }

    /// Bodies of the requests sent so far
    pub fn bodies(&self) -> Vec<Option<String>> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.body.clone())
            .collect()
    }

    /// Number of sent requests whose target contains `needle`
    pub fn count_matching(&self, needle: &str) -> usize {
        self.targets().iter().filter(|t| t.contains(needle)).count()
    }

    /// Responses not yet consumed
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: WireRequest) -> hanami_core::Result<RawResponse> {
        self.sent.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(HanamiError::Transport("no scripted response left".into())))
    }
}
