//! Command execution handlers
//!
//! Resource handlers return the [`Outcome`] of the call; printing and the exit
//! status are decided by [`print_outcome`].

use anyhow::{Context, Result};
use colored::*;
use hanami_core::api::TaskInput;
use hanami_core::{Outcome, Query, Request};
use std::path::Path;
use tracing::warn;

use crate::client::AuthenticatedClient;
use crate::config::CliConfig;
use crate::format::{format_failure, format_outcome, format_success, OutputFormat};
use crate::transport::Transport;

use super::commands::*;

/// Print `outcome` in `format`. Returns whether it was successful.
pub fn print_outcome(outcome: &Outcome, format: OutputFormat) -> Result<bool> {
    if outcome.success && outcome.body.trim().is_empty() && format == OutputFormat::Table {
        println!("{}", format_success("Done"));
    } else if outcome.success {
        println!("{}", format_outcome(outcome, format)?);
    } else {
        eprintln!("{}", format_failure(outcome));
    }
    Ok(outcome.success)
}

/// Handle token command
pub async fn handle_token<T: Transport>(client: &AuthenticatedClient<T>) -> Result<()> {
    let token = client
        .authenticate()
        .await
        .context("Failed to obtain a token")?;
    println!("{}", token.as_str());
    Ok(())
}

/// Handle raw request command
///
/// Fails without sending anything if a body is given for GET or DELETE.
pub async fn handle_request<T: Transport>(
    client: &AuthenticatedClient<T>,
    verb: hanami_core::Verb,
    path: String,
    query: Vec<(String, String)>,
    body: Option<String>,
) -> Result<Outcome> {
    let mut request = Request::new(verb, path).with_query(query.into_iter().collect::<Query>());
    if let Some(body) = body {
        if !verb.has_body() {
            anyhow::bail!("--body is only valid for POST and PUT, not {}", verb);
        }
        request = request.with_body(body);
    }
    let outcome = match client.dispatch(request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("request failed: {}", e);
            Outcome::failure()
        }
    };
    Ok(outcome)
}

/// Handle user commands
pub async fn handle_user<T: Transport>(
    client: &AuthenticatedClient<T>,
    command: UserCommands,
) -> Outcome {
    match command {
        UserCommands::Create {
            id,
            name,
            password,
            admin,
        } => client.create_user(&id, &name, &password, admin).await,
        UserCommands::Get { id } => client.get_user(&id).await,
        UserCommands::List => client.list_users().await,
        UserCommands::Delete { id } => client.delete_user(&id).await,
    }
}

/// Handle project commands
pub async fn handle_project<T: Transport>(
    client: &AuthenticatedClient<T>,
    command: ProjectCommands,
) -> Outcome {
    match command {
        ProjectCommands::Create { name } => client.create_project(&name).await,
        ProjectCommands::Get { name } => client.get_project(&name).await,
        ProjectCommands::List => client.list_projects().await,
        ProjectCommands::Delete { name } => client.delete_project(&name).await,
    }
}

/// Handle cluster commands
///
/// Fails only if the template file cannot be read.
pub async fn handle_cluster<T: Transport>(
    client: &AuthenticatedClient<T>,
    command: ClusterCommands,
) -> Result<Outcome> {
    let outcome = match command {
        ClusterCommands::Create { name, template } => {
            let content = std::fs::read_to_string(&template).with_context(|| {
                format!("Failed to read cluster template {}", template.display())
            })?;
            client.create_cluster(&name, &content).await
        }
        ClusterCommands::Get { uuid } => client.get_cluster(&uuid).await,
        ClusterCommands::List => client.list_clusters().await,
        ClusterCommands::Delete { uuid } => client.delete_cluster(&uuid).await,
        ClusterCommands::Save { name, cluster_uuid } => {
            client.save_cluster(&name, &cluster_uuid).await
        }
        ClusterCommands::Restore {
            snapshot_uuid,
            cluster_uuid,
        } => client.restore_cluster(&snapshot_uuid, &cluster_uuid).await,
        ClusterCommands::TaskMode { uuid } => client.set_cluster_task_mode(&uuid).await,
    };
    Ok(outcome)
}

/// Handle cluster snapshot commands
pub async fn handle_snapshot<T: Transport>(
    client: &AuthenticatedClient<T>,
    command: SnapshotCommands,
) -> Outcome {
    match command {
        SnapshotCommands::Get { uuid } => client.get_snapshot(&uuid).await,
        SnapshotCommands::List => client.list_snapshots().await,
        SnapshotCommands::Delete { uuid } => client.delete_snapshot(&uuid).await,
    }
}

/// Handle template commands
///
/// Fails if an uploaded template cannot be read or is not valid JSON.
pub async fn handle_template<T: Transport>(
    client: &AuthenticatedClient<T>,
    command: TemplateCommands,
) -> Result<Outcome> {
    let outcome = match command {
        TemplateCommands::Generate {
            name,
            data_set,
            kind,
        } => client.generate_template(&name, &kind, &data_set).await,
        TemplateCommands::Upload { name, template } => {
            let content = std::fs::read_to_string(&template)
                .with_context(|| format!("Failed to read template {}", template.display()))?;
            let value: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Template {} is not valid JSON", template.display()))?;
            client.upload_template(&name, &value).await
        }
        TemplateCommands::Get { uuid } => client.get_template(&uuid).await,
        TemplateCommands::List => client.list_templates().await,
        TemplateCommands::Delete { uuid } => client.delete_template(&uuid).await,
    };
    Ok(outcome)
}

/// Handle task commands
///
/// Graph tasks need `--column`; image tasks must not have one.
pub async fn handle_task<T: Transport>(
    client: &AuthenticatedClient<T>,
    command: TaskCommands,
) -> Result<Outcome> {
    let outcome = match command {
        TaskCommands::Create {
            name,
            input,
            kind,
            cluster,
            data_set,
            column,
        } => match (TaskInput::from(input), column) {
            (TaskInput::Image, None) => {
                client
                    .create_image_task(kind.into(), &name, &cluster, &data_set)
                    .await
            }
            (TaskInput::Graph, Some(column)) => {
                client
                    .create_graph_task(kind.into(), &name, &cluster, &data_set, &column)
                    .await
            }
            (TaskInput::Image, Some(_)) => {
                anyhow::bail!("--column is only valid for graph tasks")
            }
            (TaskInput::Graph, None) => anyhow::bail!("graph tasks need --column"),
        },
        TaskCommands::Get { uuid, cluster } => client.get_task(&uuid, &cluster).await,
        TaskCommands::List { cluster } => client.list_tasks(&cluster).await,
        TaskCommands::Delete { uuid, cluster } => client.delete_task(&uuid, &cluster).await,
    };
    Ok(outcome)
}

/// Handle data set commands
pub async fn handle_data_set<T: Transport>(
    client: &AuthenticatedClient<T>,
    command: DataSetCommands,
) -> Outcome {
    match command {
        DataSetCommands::Get { uuid } => client.get_data_set(&uuid).await,
        DataSetCommands::List => client.list_data_sets().await,
        DataSetCommands::Delete { uuid } => client.delete_data_set(&uuid).await,
        DataSetCommands::Progress { uuid } => client.data_set_progress(&uuid).await,
        DataSetCommands::Check {
            data_set_uuid,
            result_uuid,
        } => client.check_data_set(&data_set_uuid, &result_uuid).await,
    }
}

/// Handle config commands
pub fn handle_config(
    command: ConfigCommands,
    current_config: &CliConfig,
    config_path: &Path,
    format: OutputFormat,
) -> Result<()> {
    match command {
        ConfigCommands::Show => match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&redacted(current_config))?);
            }
            OutputFormat::Table => {
                println!("{}", "CLI Configuration:".bold());
                println!("{:<22} Value", "Setting");
                println!("{}", "-".repeat(50));
                println!(
                    "{:<22} {}",
                    "Address",
                    current_config.address.as_deref().unwrap_or("-")
                );
                println!(
                    "{:<22} {}",
                    "Port",
                    current_config
                        .port
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
                println!(
                    "{:<22} {}",
                    "User",
                    current_config.user.as_deref().unwrap_or("-")
                );
                println!(
                    "{:<22} {}",
                    "Password",
                    mask(current_config.password.as_deref())
                );
                println!("{:<22} {}", "Token", mask(current_config.token.as_deref()));
                println!("{:<22} {}", "Auth Service", current_config.service);
                println!(
                    "{:<22} {}",
                    "CA Certificate",
                    current_config
                        .ca_cert
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
                println!(
                    "{:<22} {}",
                    "Accept Invalid Certs", current_config.accept_invalid_certs
                );
                println!("{:<22} {}s", "Timeout", current_config.timeout);
                println!("{:<22} {}", "Output Format", current_config.output_format);
                println!("{:<22} {}", "Verbose", current_config.verbose);
            }
        },
        ConfigCommands::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Copy of the config with secrets replaced
fn redacted(config: &CliConfig) -> CliConfig {
    let mut config = config.clone();
    config.password = config.password.as_ref().map(|_| "***".to_string());
    config.token = config.token.as_ref().map(|_| "***".to_string());
    config
}

fn mask(secret: Option<&str>) -> String {
    match secret {
        Some(_) => "***".to_string(),
        None => "-".to_string(),
    }
}

/// Generate shell completion script
pub fn generate_completion(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedTransport;
    use crate::token::TokenStore;
    use crate::transport::RawResponse;
    use hanami_core::{Credentials, Endpoint, Token, Verb};
    use std::io::Write;

    fn client(
        responses: Vec<RawResponse>,
    ) -> (AuthenticatedClient<ScriptedTransport>, ScriptedTransport) {
        let transport = ScriptedTransport::new(responses.into_iter().map(Ok).collect());
        let client = AuthenticatedClient::with_transport(
            Endpoint::new("http://host", 11418).unwrap(),
            Some(Credentials::new("alice", "pw1")),
            transport.clone(),
        )
        .with_token_store(TokenStore::with_token(Token::new("T1")));
        (client, transport)
    }

    #[tokio::test]
    async fn test_handle_request_builds_query() {
        let (client, transport) = client(vec![RawResponse::new(200, "ok")]);

        let outcome = handle_request(
            &client,
            Verb::Put,
            "control/misaki/v1/user".to_string(),
            vec![("id".to_string(), "a b".to_string())],
            Some(r#"{"name":"A"}"#.to_string()),
        )
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::new(true, "ok"));
        assert_eq!(
            transport.targets(),
            vec!["PUT /control/misaki/v1/user?token=T1&id=a+b"]
        );
        assert_eq!(transport.bodies()[0].as_deref(), Some(r#"{"name":"A"}"#));
    }

    #[tokio::test]
    async fn test_handle_request_invalid_path_fails() {
        let (client, transport) = client(vec![]);

        let outcome = handle_request(
            &client,
            Verb::Get,
            "control/x?id=1".to_string(),
            Vec::new(),
            None,
        )
        .await
        .unwrap();

        assert_eq!(outcome, Outcome::failure());
        assert!(transport.targets().is_empty());
    }

    #[tokio::test]
    async fn test_handle_request_rejects_body_on_get_and_delete() {
        let (client, transport) = client(vec![RawResponse::new(200, "ok")]);

        for verb in [Verb::Get, Verb::Delete] {
            let result = handle_request(
                &client,
                verb,
                "control/misaki/v1/user".to_string(),
                Vec::new(),
                Some("{}".to_string()),
            )
            .await;
            assert!(result.is_err());
        }

        assert!(transport.targets().is_empty());
        assert_eq!(transport.remaining(), 1);
    }

    #[tokio::test]
    async fn test_handle_cluster_create_reads_template() {
        let (client, transport) = client(vec![RawResponse::new(200, "{}")]);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "version: 1").unwrap();

        let outcome = handle_cluster(
            &client,
            ClusterCommands::Create {
                name: "c1".to_string(),
                template: file.path().to_path_buf(),
            },
        )
        .await
        .unwrap();

        assert!(outcome.success);
        assert_eq!(
            transport.targets(),
            vec!["POST /control/kyouko/v1/cluster?token=T1"]
        );
    }

    #[tokio::test]
    async fn test_handle_cluster_missing_template() {
        let (client, transport) = client(vec![]);

        let result = handle_cluster(
            &client,
            ClusterCommands::Create {
                name: "c1".to_string(),
                template: "/nonexistent/template.yaml".into(),
            },
        )
        .await;

        assert!(result.is_err());
        assert!(transport.targets().is_empty());
    }

    #[tokio::test]
    async fn test_handle_task_and_data_set() {
        let (client, transport) = client(vec![
            RawResponse::new(200, "[]"),
            RawResponse::new(200, "{}"),
        ]);

        handle_task(
            &client,
            TaskCommands::List {
                cluster: "c1".to_string(),
            },
        )
        .await
        .unwrap();
        handle_data_set(
            &client,
            DataSetCommands::Delete {
                uuid: "d1".to_string(),
            },
        )
        .await;

        assert_eq!(
            transport.targets(),
            vec![
                "GET /control/kyouko/v1/task/all?token=T1&cluster_uuid=c1",
                "DELETE /control/sagiri/v1/data_set?token=T1&uuid=d1",
            ]
        );
    }

    #[tokio::test]
    async fn test_handle_task_create_checks_column() {
        let (client, transport) = client(vec![RawResponse::new(200, "{}")]);

        let create = |input, column: Option<&str>| TaskCommands::Create {
            name: "train".to_string(),
            input,
            kind: TaskKindArg::Learn,
            cluster: "c1".to_string(),
            data_set: "d1".to_string(),
            column: column.map(str::to_string),
        };

        assert!(handle_task(&client, create(TaskInputArg::Graph, None))
            .await
            .is_err());
        assert!(handle_task(&client, create(TaskInputArg::Image, Some("x")))
            .await
            .is_err());
        assert!(transport.targets().is_empty());

        let outcome = handle_task(&client, create(TaskInputArg::Graph, Some("price")))
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(
            transport.targets(),
            vec!["POST /control/kyouko/v1/task/graph/learn?token=T1"]
        );
    }

    #[tokio::test]
    async fn test_handle_template_upload_reads_json() {
        let (client, transport) = client(vec![RawResponse::new(200, "{}")]);

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, "bricks: [").unwrap();
        let result = handle_template(
            &client,
            TemplateCommands::Upload {
                name: "tpl".to_string(),
                template: bad.path().to_path_buf(),
            },
        )
        .await;
        assert!(result.is_err());
        assert!(transport.targets().is_empty());

        let mut good = tempfile::NamedTempFile::new().unwrap();
        write!(good, r#"{{"bricks":[]}}"#).unwrap();
        let outcome = handle_template(
            &client,
            TemplateCommands::Upload {
                name: "tpl".to_string(),
                template: good.path().to_path_buf(),
            },
        )
        .await
        .unwrap();

        assert!(outcome.success);
        assert_eq!(
            transport.bodies()[0].as_deref(),
            Some(r#"{"name":"tpl","template":{"bricks":[]}}"#)
        );
    }

    #[tokio::test]
    async fn test_handle_snapshot_and_task_mode() {
        let (client, transport) = client(vec![
            RawResponse::new(200, "[]"),
            RawResponse::new(200, "{}"),
        ]);

        handle_snapshot(&client, SnapshotCommands::List).await;
        handle_cluster(
            &client,
            ClusterCommands::TaskMode {
                uuid: "c1".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            transport.targets(),
            vec![
                "GET /control/sagiri/v1/cluster_snapshot/all?token=T1",
                "PUT /control/kyouko/v1/cluster/set_mode?token=T1",
            ]
        );
    }

    #[test]
    fn test_redacted_config_hides_secrets() {
        let config = CliConfig {
            password: Some("pw1".to_string()),
            token: Some("T1".to_string()),
            ..CliConfig::default()
        };
        let shown = serde_json::to_string(&redacted(&config)).unwrap();
        assert!(!shown.contains("pw1"));
        assert!(!shown.contains("\"T1\""));
        assert_eq!(mask(None), "-");
    }
}
