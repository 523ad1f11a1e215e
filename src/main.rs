//! mcpguide - Local knowledge base of MCP specifications.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mcpguide::config::{ConfigLoader, KnowledgeConfig};
use mcpguide::display;
use mcpguide::host::SpecServer;
use mcpguide::knowledge::KnowledgeBaseManager;

#[derive(Parser)]
#[command(
    name = "mcpguide",
    about = "Local knowledge base of MCP specifications",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Knowledge base path (overrides the config file).
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the latest specifications for all versions.
    Sync,
    /// Sync, then serve the knowledge base over HTTP.
    Serve {
        /// Host address to bind to.
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the specification for a version (latest by default).
    Spec {
        /// Protocol version.
        version: Option<String>,
    },
    /// Print documentation for a topic (usage guide by default).
    Docs {
        /// Documentation topic.
        topic: Option<String>,
    },
    /// Show the manifest of the most recent sync.
    Status,
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<KnowledgeConfig, ExitCode> {
    let loader = cli
        .config
        .clone()
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let mut config = loader.load().map_err(|e| {
        display::print_error(&e.to_string());
        ExitCode::FAILURE
    })?;
    if let Some(path) = &cli.path {
        config.base_path.clone_from(path);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match load_config(&cli) {
        Ok(config) => config,
        Err(code) => return code,
    };
    let manager = match KnowledgeBaseManager::from_config(&config) {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Invalid repository registry");
            display::print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Sync => {
            let report = manager.initialize().await;
            display::print_sync_report(&report, manager.base_path());
            if report.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let report = manager.initialize().await;
            display::print_sync_report(&report, manager.base_path());

            let cancel = CancellationToken::new();
            let shutdown = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Received Ctrl-C");
                }
                shutdown.cancel();
            });

            let server = SpecServer::new(Arc::new(manager), cancel).with_config(config.server);
            match server.run().await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    display::print_error(&e.to_string());
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Spec { version } => match manager.get_specification(version.as_deref()).await {
            Some(spec) => match serde_json::to_string_pretty(&*spec) {
                Ok(text) => {
                    println!("{text}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    display::print_error(&e.to_string());
                    ExitCode::FAILURE
                }
            },
            None => {
                display::print_error("Specification not found. Run `mcpguide sync` first.");
                ExitCode::FAILURE
            }
        },
        Commands::Docs { topic } => match manager.get_documentation(topic.as_deref()).await {
            Some(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            None => {
                display::print_error("Documentation not found. Run `mcpguide sync` first.");
                ExitCode::FAILURE
            }
        },
        Commands::Status => match manager.read_manifest().await {
            Some(manifest) => {
                display::print_manifest(&manifest);
                ExitCode::SUCCESS
            }
            None => {
                display::print_error("No sync has been recorded yet.");
                ExitCode::FAILURE
            }
        },
    }
}
