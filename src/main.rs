//! Personal Knowledge - context selection and system prompt assembly.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use personal_knowledge::ai::AiClient;
use personal_knowledge::config::{AppConfig, ConfigLoader, ModelCatalog};
use personal_knowledge::display;
use personal_knowledge::knowledge::{compose, KnowledgeManager};
use personal_knowledge::server::{AppState, StatusServer};

#[derive(Parser)]
#[command(
    name = "personal-knowledge",
    about = "Select personal knowledge and assemble system prompts",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the status and prompt API.
    Serve {
        /// Host address to bind to.
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on.
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the system prompt composed for a message.
    Prompt {
        /// The user's message.
        message: String,
        /// Ask the remote model which documents are relevant.
        #[arg(long)]
        intelligent: bool,
        /// Base prompt to extend instead of the configured one.
        #[arg(long)]
        base_prompt: Option<String>,
    },
    /// List loaded knowledge documents.
    Keys,
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

fn load_config(path: Option<PathBuf>) -> Result<AppConfig, String> {
    let loader = path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    loader.load().map_err(|e| e.to_string())
}

fn build_manager(config: &AppConfig) -> KnowledgeManager {
    let client = match AiClient::from_config(config.ai.clone()) {
        Ok(client) => {
            tracing::info!(
                provider = ?client.provider_kind(),
                model = %client.model(),
                "Remote selector configured"
            );
            Some(client)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Remote selector unavailable, using keyword matching");
            None
        }
    };
    KnowledgeManager::from_config(&config.knowledge, client)
}

async fn serve(config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<(), String> {
    let models =
        ModelCatalog::with_default(config.default_model.as_deref()).map_err(|e| e.to_string())?;
    let manager = Arc::new(build_manager(&config));
    let base_prompt = config.knowledge.base_prompt();

    let mut server_config = config.server.clone();
    if let Some(host) = host {
        server_config.host = host;
    }
    if let Some(port) = port {
        server_config.port = port;
    }

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C");
            shutdown.cancel();
        }
    });

    let state = AppState::new(manager, models, &base_prompt);
    StatusServer::new(state)
        .with_config(server_config)
        .run(cancel)
        .await
        .map_err(|e| e.to_string())
}

async fn prompt(
    config: &AppConfig,
    message: &str,
    intelligent: bool,
    base_prompt: Option<String>,
) {
    let manager = build_manager(config);
    let context = if intelligent {
        manager.find_relevant_context_intelligent(message).await
    } else {
        manager.find_relevant_context(message)
    };
    let base = base_prompt.unwrap_or_else(|| config.knowledge.base_prompt());

    display::print_sources(&context);
    println!("{}", compose(&base, &context));
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            display::print_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Serve { host, port } => serve(config, host, port).await,
        Commands::Prompt {
            message,
            intelligent,
            base_prompt,
        } => {
            prompt(&config, &message, intelligent, base_prompt).await;
            Ok(())
        }
        Commands::Keys => {
            display::print_status(&build_manager(&config).status());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            display::print_error(&e);
            ExitCode::FAILURE
        }
    }
}
