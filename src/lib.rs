pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod policy;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{ApiUserCommands, Cli, Commands, UserCommands};
pub use config::Config;
use entities::users::Role;

pub async fn run(config: Config) -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&config);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::Init => cli::cmd_init(),
        Commands::User { command } => match command {
            UserCommands::Promote { username } => {
                cli::cmd_set_role(&config, &username, Role::Admin).await
            }
            UserCommands::Demote { username } => {
                cli::cmd_set_role(&config, &username, Role::User).await
            }
        },
        Commands::ApiUser { command } => match command {
            ApiUserCommands::Add { username, password } => {
                cli::cmd_api_user_add(&config, &username, &password).await
            }
            ApiUserCommands::Remove { username } => {
                cli::cmd_api_user_remove(&config, &username).await
            }
        },
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = if config.general.debug {
        "debug"
    } else {
        config.general.log_level.as_str()
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let (json, plain) = if config.observability.json_logs {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(plain)
        .init();
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    info!("Brink v{} starting...", env!("CARGO_PKG_VERSION"));

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let api_version = config.server.api_version.clone();

    let state = api::create_app_state_from_config(config, prometheus_handle).await?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("API running at http://{}/{}", addr, api_version);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
