use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use mcp_github_projects::client::{ProjectsClient, DEFAULT_API_URL};
use mcp_github_projects::error::ProjectsError;
use mcp_github_projects::server;
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::EnvFilter;

/// MCP server for GitHub Projects V2: lets LLMs manage project boards and items
#[derive(Parser)]
#[command(name = "mcp-github-projects", version, about)]
struct Cli {
    /// GitHub personal access token (needs the `project` scope, plus `repo` to create issues).
    /// Can also be set via GITHUB_TOKEN environment variable.
    #[arg(long)]
    token: Option<String>,

    /// Read GitHub token from an environment variable.
    /// Default: GITHUB_TOKEN
    #[arg(long = "token-env")]
    token_env: Option<String>,

    /// Default project owner (user or org) for list_projects and get_project
    #[arg(long)]
    owner: Option<String>,

    /// Default page size for list operations (capped at 100)
    #[arg(long, default_value = "20")]
    max_results: u32,

    /// GitHub API base URL; GraphQL requests go to <api-url>/graphql
    #[arg(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Resolve token: --token > --token-env > GITHUB_TOKEN
    let token = if let Some(t) = cli.token.filter(|t| !t.is_empty()) {
        t
    } else {
        let env_name = cli.token_env.as_deref().unwrap_or("GITHUB_TOKEN");
        match std::env::var(env_name) {
            Ok(t) if !t.is_empty() => {
                tracing::info!(env = env_name, "Read GitHub token from environment variable");
                t
            }
            _ => {
                tracing::error!(env = env_name, "No GitHub token provided");
                return Err(ProjectsError::Authentication(format!(
                    "a GitHub token is required (pass --token or set {env_name})"
                ))
                .into());
            }
        }
    };

    let client = ProjectsClient::connect(
        &token,
        &cli.api_url,
        Duration::from_secs(cli.timeout_secs),
    )?;

    tracing::info!(
        api_url = %cli.api_url,
        owner = cli.owner.as_deref().unwrap_or("none"),
        max_results = cli.max_results,
        timeout_secs = cli.timeout_secs,
        "Starting mcp-github-projects server"
    );

    let service = server::ProjectsServer::new(client, cli.owner, cli.max_results);
    let running = service.serve(stdio()).await?;
    running.waiting().await?;

    Ok(())
}
