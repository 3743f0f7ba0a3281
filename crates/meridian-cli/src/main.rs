//! Meridian CLI - deploy pipelines, aliases and team namespaces.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "meridian")]
#[command(about = "Deploy pipelines, aliases and team namespaces")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to meridian.toml if present)
    #[arg(short, long, global = true, env = "MERIDIAN_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a pipeline, its aliases and the team namespace
    Deploy(commands::deploy::DeployArgs),

    /// Build a container image and wait for it to finish
    Build(commands::build::BuildArgs),

    /// Print the manifests each unit would deploy
    Render(commands::render::RenderArgs),

    /// Wait for a deployed application to report healthy
    Status(commands::status::StatusArgs),
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let cancel = CancellationToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal(cancel_on_signal.clone()).await;
        cancel_on_signal.cancel();
    });

    let config = cli.config.as_deref();
    let result: anyhow::Result<()> = match cli.command {
        Commands::Deploy(args) => commands::deploy::run(config, args, &cancel).await,
        Commands::Build(args) => commands::build::run(config, args, &cancel).await,
        Commands::Render(args) => commands::render::run(config, &args),
        Commands::Status(args) => commands::status::run(config, args, &cancel).await,
    };
    cancel.cancel();

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            info!("received Ctrl+C, cancelling");
        }
        () = cancel.cancelled() => {}
    }
}
