// Standalone MCP server binary

use airflow_mcp::{LineTransport, McpHandler, McpServer};
use airflow_sdk::{AccessLevel, AuthMode, ClientConfig};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "airflow-mcp")]
#[command(about = "MCP server exposing the Apache Airflow REST API as tools", long_about = None)]
struct Args {
    /// Airflow webserver base URL
    #[arg(long, env = "AIRFLOW_BASE_URL", default_value = "http://localhost:8080")]
    base_url: String,

    /// Authentication type: basic, bearer or jwt
    #[arg(long, env = "AIRFLOW_AUTH_TYPE", default_value = "basic")]
    auth_type: AuthMode,

    /// Username for basic auth
    #[arg(long, env = "AIRFLOW_USERNAME")]
    username: Option<String>,

    /// Password for basic auth
    #[arg(long, env = "AIRFLOW_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Token for bearer auth
    #[arg(long, env = "AIRFLOW_JWT_TOKEN", hide_env_values = true)]
    jwt_token: Option<String>,

    /// Access level: read_only or full
    #[arg(long, env = "AIRFLOW_ACCESS_LEVEL", default_value = "read_only")]
    access_level: AccessLevel,

    /// Verify TLS certificates
    #[arg(long, env = "AIRFLOW_VERIFY_SSL", default_value_t = true, action = ArgAction::Set)]
    verify_ssl: bool,

    /// Request timeout in seconds
    #[arg(long, env = "AIRFLOW_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn client_config(&self) -> Result<ClientConfig> {
        let mut builder = ClientConfig::builder()
            .base_url(&self.base_url)
            .auth_mode(self.auth_type)
            .access_level(self.access_level)
            .verify_tls(self.verify_ssl)
            .timeout(Duration::from_secs(self.timeout));

        if let Some(username) = &self.username {
            builder = builder.username(username);
        }
        if let Some(password) = &self.password {
            builder = builder.password(password);
        }
        if let Some(token) = &self.jwt_token {
            builder = builder.token(token);
        }

        builder.build().context("Invalid Airflow configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries protocol messages only
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.as_str().into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Airflow MCP Server starting...");

    let config = match args.client_config() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            tracing::error!("Failed to start server: {:#}", e);
            return Err(e);
        }
    };

    tracing::info!("Airflow URL: {}", config.base_url());
    tracing::info!("Auth type: {}", config.auth_mode());
    tracing::info!("Access level: {}", config.access_level());

    let transport = LineTransport::new(tokio::io::stdin(), tokio::io::stdout());
    let mut server = McpServer::new(transport, McpHandler::new(config));
    server.run().await?;

    Ok(())
}
