//! Multi-agent code generation service - main entry point

use clap::{Parser, Subcommand};
use codegen_agents::agents::{CompletionSettings, LlmPipelineAgents};
use codegen_agents::config::AppConfig;
use codegen_agents::llm::build_provider;
use codegen_agents::observability::init_default_logging;
use codegen_agents::server::{ApiServer, AppState};
use codegen_agents::tasks::{InMemoryTaskStore, TaskService};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

/// LLM agent pipeline for code generation, served over HTTP
#[derive(Parser)]
#[command(name = "codegen-agents")]
#[command(about = "Multi-agent code generation service")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "CODEGEN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve,
    /// Validate configuration
    Config {
        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!(
        "Starting codegen-agents v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Config { show } => handle_config_command(&config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Application shutdown complete");
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<AppConfig, Box<dyn std::error::Error>> {
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path.display());
        return Ok(AppConfig::load_from_file(path)?);
    }

    for path_str in ["codegen.toml", "config/codegen.toml"] {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            return Ok(AppConfig::load_from_file(&path)?);
        }
    }

    info!("No configuration file found, using defaults and environment");
    Ok(AppConfig::from_env()?)
}

async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let api_key = config.get_llm_api_key()?;
    let provider = build_provider(&config.llm, api_key)?;

    if let Err(e) = provider.health_check().await {
        warn!(
            provider = provider.name(),
            error = %e,
            "LLM provider health check failed, starting anyway"
        );
    }

    let agents = Arc::new(LlmPipelineAgents::new(
        provider,
        CompletionSettings::from(&config.llm),
    ));
    let service = Arc::new(TaskService::new(
        Arc::new(InMemoryTaskStore::new()),
        agents,
        config.pipeline.parallel_analysis,
    ));

    info!(
        provider = config.llm.provider.as_str(),
        model = %config.llm.model,
        env = %config.app.env,
        parallel_analysis = config.pipeline.parallel_analysis,
        "Pipeline ready"
    );

    let server = ApiServer::new(AppState::new(service, Arc::new(config)))?;
    server.start(shutdown_signal()).await?;
    Ok(())
}

fn handle_config_command(config: &AppConfig, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("{}", toml::to_string_pretty(config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let (mut sigint, mut sigterm) =
        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
            _ => {
                warn!("Could not install signal handlers, waiting for Ctrl-C instead");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

    tokio::select! {
        _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully..."),
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully..."),
    }
}
