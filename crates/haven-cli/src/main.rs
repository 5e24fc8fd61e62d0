mod cli;
mod repl;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use haven_ai::{Conversation, ConversationOptions, EnvCredential, HavenClient, SessionDirectory};
use haven_common::HavenError;
use haven_config::HavenConfig;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_DIRECTIVE: &str = "haven=info";

fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_env("HAVEN_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or(DEFAULT_LOG_DIRECTIVE)));

    // stdout carries the transcript; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &cli::Args) -> HavenConfig {
    if let Some(path) = &args.config {
        tracing::info!("Using config override: {path}");
    }
    let loaded = haven_config::load_config(args.config.as_deref().map(Path::new));

    let mut config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        HavenConfig::default()
    });

    if let Some(url) = &args.base_url {
        config.api.base_url = url.clone();
    }
    config
}

async fn run(args: cli::Args) -> Result<(), HavenError> {
    let config = load_config(&args);
    tracing::info!(base_url = %config.api.base_url, "config loaded");

    if args.print_config {
        println!("{}", haven_config::config_to_json(&config));
        return Ok(());
    }

    let client = HavenClient::new(config.api.clone())?;
    let credentials = Arc::new(EnvCredential::new(config.auth.token_env.clone()));
    let conversation = Conversation::new(
        client,
        credentials,
        ConversationOptions::from_config(&config),
    );
    let directory = SessionDirectory::new(config.directory.clone());

    repl::Repl::new(conversation, directory).run().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    init_logging(args.log_level.as_deref());

    tracing::info!("Haven v{} starting...", env!("CARGO_PKG_VERSION"));

    match run(args).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("haven: {e}");
            ExitCode::FAILURE
        }
    }
}
