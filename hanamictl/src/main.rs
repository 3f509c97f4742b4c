//! Hanami CLI
//!
//! Command-line interface for the Hanami control API.

use anyhow::Result;
use clap::Parser;
use hanamictl::cli::{
    generate_completion, handle_cluster, handle_config, handle_data_set, handle_project,
    handle_request, handle_snapshot, handle_task, handle_template, handle_token, handle_user,
    print_outcome, Cli, Commands,
};
use hanamictl::client::AuthenticatedClient;
use hanamictl::config::CliConfig;
use hanamictl::format::OutputFormat;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Completion needs neither config nor server
    if let Commands::Completion { shell } = cli.command {
        generate_completion(shell);
        return Ok(());
    }

    // Build configuration using priority chain: CLI args → env → file → defaults.
    // Each layer only fills what is still unset.
    let mut builder = CliConfig::builder();

    if let Some(ref address) = cli.address {
        builder = builder.with_address(address)?;
    }
    if let Some(port) = cli.port {
        builder = builder.with_port(port)?;
    }
    if let Some(ref user) = cli.user {
        builder = builder.with_user(user);
    }
    if let Some(timeout) = cli.timeout {
        builder = builder.with_timeout(timeout)?;
    }
    if let Some(ref format) = cli.format {
        builder = builder.with_output_format(format.as_str())?;
    }
    if cli.verbose {
        builder = builder.with_verbose(true);
    }

    builder = builder.with_env_overrides()?;

    let config_path = cli.config.clone().unwrap_or_else(CliConfig::config_path);
    if !cli.no_config {
        builder = builder.with_config_file(Some(&config_path))?;
    }

    let config = match builder.build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            if cli.verbose {
                eprintln!("Error details: {:?}", e);
            }
            std::process::exit(1);
        }
    };

    init_tracing(config.verbose);

    let output_format = OutputFormat::from_config(&config.output_format);

    if let Commands::Config { command } = cli.command {
        return handle_config(command, &config, &config_path, output_format);
    }

    let client = match AuthenticatedClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: Cannot set up the client");
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    tracing::debug!("using endpoint {}", client.endpoint());

    let result = match cli.command {
        Commands::Token => handle_token(&client).await.map(|_| true),
        Commands::Request {
            verb,
            path,
            query,
            body,
        } => handle_request(&client, verb, path, query, body)
            .await
            .and_then(|outcome| print_outcome(&outcome, output_format)),
        Commands::User { command } => {
            print_outcome(&handle_user(&client, command).await, output_format)
        }
        Commands::Project { command } => {
            print_outcome(&handle_project(&client, command).await, output_format)
        }
        Commands::Cluster { command } => handle_cluster(&client, command)
            .await
            .and_then(|outcome| print_outcome(&outcome, output_format)),
        Commands::Snapshot { command } => {
            print_outcome(&handle_snapshot(&client, command).await, output_format)
        }
        Commands::Template { command } => handle_template(&client, command)
            .await
            .and_then(|outcome| print_outcome(&outcome, output_format)),
        Commands::Task { command } => handle_task(&client, command)
            .await
            .and_then(|outcome| print_outcome(&outcome, output_format)),
        Commands::Dataset { command } => {
            print_outcome(&handle_data_set(&client, command).await, output_format)
        }
        Commands::Config { .. } | Commands::Completion { .. } => Ok(true),
    };

    match result {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            if config.verbose {
                eprintln!("Error details: {:?}", e);
            }
            std::process::exit(1);
        }
    }
}

/// Initialize tracing on stderr so stdout stays clean for command output.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
