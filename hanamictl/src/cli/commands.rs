//! CLI command and subcommand definitions

use clap::{Parser, Subcommand};
use hanami_core::api::{TaskInput, TaskKind};
use hanami_core::Verb;
use std::path::PathBuf;

/// Hanami control API CLI
#[derive(Parser, Debug)]
#[command(name = "hanamictl")]
#[command(version, about = "Hanami control API CLI", long_about = None)]
pub struct Cli {
    /// Server address, e.g. https://hanami.local (overrides config file)
    #[arg(short, long, global = true)]
    pub address: Option<String>,

    /// Server port (overrides config file)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// User name for authentication (password comes from HANAMI_PW or the config file)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Output format (overrides config file)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Don't load config file
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Config file path (default: ~/.config/hanami/cli.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty table output
    Table,
    /// JSON output
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        }
    }
}

/// Input a new task works on
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TaskInputArg {
    Image,
    Graph,
}

impl From<TaskInputArg> for TaskInput {
    fn from(arg: TaskInputArg) -> Self {
        match arg {
            TaskInputArg::Image => TaskInput::Image,
            TaskInputArg::Graph => TaskInput::Graph,
        }
    }
}

/// Whether a new task trains the cluster or queries it
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TaskKindArg {
    Learn,
    Request,
}

impl From<TaskKindArg> for TaskKind {
    fn from(arg: TaskKindArg) -> Self {
        match arg {
            TaskKindArg::Learn => TaskKind::Learn,
            TaskKindArg::Request => TaskKind::Request,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Request a new token and print it
    Token,

    /// Send a raw request to any control API path
    Request {
        /// HTTP verb (get, post, put, delete)
        verb: Verb,

        /// Resource path, e.g. control/misaki/v1/user/all
        path: String,

        /// Query parameter as key=value (repeatable)
        #[arg(short, long = "query", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        query: Vec<(String, String)>,

        /// JSON request body (POST and PUT)
        #[arg(short, long)]
        body: Option<String>,
    },

    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Project management commands
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Cluster management commands
    Cluster {
        #[command(subcommand)]
        command: ClusterCommands,
    },

    /// Cluster snapshot commands
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommands,
    },

    /// Cluster template commands
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },

    /// Task commands
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Data set commands
    Dataset {
        #[command(subcommand)]
        command: DataSetCommands,
    },

    /// Show CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Create a user
    Create {
        /// User ID
        id: String,

        /// Display name
        name: String,

        /// Initial password
        #[arg(long)]
        password: String,

        /// Grant admin rights
        #[arg(long)]
        admin: bool,
    },

    /// Show a user
    Get {
        /// User ID
        id: String,
    },

    /// List all users
    List,

    /// Delete a user
    Delete {
        /// User ID
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a project
    Create {
        /// Project name
        name: String,
    },

    /// Show a project
    Get {
        /// Project name
        name: String,
    },

    /// List all projects
    List,

    /// Delete a project
    Delete {
        /// Project name
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ClusterCommands {
    /// Create a cluster from a template file
    Create {
        /// Cluster name
        name: String,

        /// Path to the cluster template
        #[arg(short, long)]
        template: PathBuf,
    },

    /// Show a cluster
    Get {
        /// Cluster UUID
        uuid: String,
    },

    /// List all clusters
    List,

    /// Delete a cluster
    Delete {
        /// Cluster UUID
        uuid: String,
    },

    /// Save a snapshot of a cluster
    Save {
        /// Snapshot name
        name: String,

        /// Cluster UUID
        cluster_uuid: String,
    },

    /// Restore a cluster from a snapshot
    Restore {
        /// Snapshot UUID
        snapshot_uuid: String,

        /// Cluster UUID
        cluster_uuid: String,
    },

    /// Switch a cluster to task mode
    TaskMode {
        /// Cluster UUID
        uuid: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum SnapshotCommands {
    /// Show a cluster snapshot
    Get {
        /// Snapshot UUID
        uuid: String,
    },

    /// List all cluster snapshots
    List,

    /// Delete a cluster snapshot
    Delete {
        /// Snapshot UUID
        uuid: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// Generate a template sized for a data set
    Generate {
        /// Template name
        name: String,

        /// Data set UUID
        #[arg(short, long = "data-set")]
        data_set: String,

        /// Template type
        #[arg(short = 't', long = "type", default_value = "image")]
        kind: String,
    },

    /// Upload a template from a JSON file
    Upload {
        /// Template name
        name: String,

        /// Path to the JSON template
        #[arg(short, long)]
        template: PathBuf,
    },

    /// Show a template
    Get {
        /// Template UUID
        uuid: String,
    },

    /// List all templates
    List,

    /// Delete a template
    Delete {
        /// Template UUID
        uuid: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a learn or request task
    Create {
        /// Task name
        name: String,

        /// Input type
        #[arg(short, long, value_enum)]
        input: TaskInputArg,

        /// Learn or request
        #[arg(short = 't', long = "type", value_enum)]
        kind: TaskKindArg,

        /// UUID of the cluster to run the task on
        #[arg(short, long)]
        cluster: String,

        /// Data set UUID
        #[arg(short, long = "data-set")]
        data_set: String,

        /// Data set column (graph tasks only)
        #[arg(long)]
        column: Option<String>,
    },

    /// Show a task
    Get {
        /// Task UUID
        uuid: String,

        /// UUID of the cluster running the task
        #[arg(short, long)]
        cluster: String,
    },

    /// List the tasks of a cluster
    List {
        /// Cluster UUID
        #[arg(short, long)]
        cluster: String,
    },

    /// Delete a task
    Delete {
        /// Task UUID
        uuid: String,

        /// UUID of the cluster running the task
        #[arg(short, long)]
        cluster: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum DataSetCommands {
    /// Show a data set
    Get {
        /// Data set UUID
        uuid: String,
    },

    /// List all data sets
    List,

    /// Delete a data set
    Delete {
        /// Data set UUID
        uuid: String,
    },

    /// Show upload progress of a data set
    Progress {
        /// Data set UUID
        uuid: String,
    },

    /// Compare a request task result with a data set
    Check {
        /// Data set UUID
        data_set_uuid: String,

        /// Result UUID of the request task
        result_uuid: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,
}

/// Parse a `key=value` query argument.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no '=' found in '{}'", s))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}
