//! Scorecard server binary.

use anyhow::{Context, Result};
use clap::Parser;
use scorecard_server::{http, Orchestrator, ServerConfig};

#[derive(Parser)]
#[command(name = "scorecard-server")]
#[command(about = "Repository quality scorecards over a polling HTTP API", long_about = None)]
#[command(version)]
struct Cli {
    /// Bind address, e.g. 127.0.0.1:7878
    #[arg(long)]
    bind: Option<String>,

    /// Reports root directory
    #[arg(long)]
    reports_root: Option<std::path::PathBuf>,

    /// Repository cache root directory
    #[arg(long)]
    repo_root: Option<std::path::PathBuf>,

    /// AI provider: openai or anthropic
    #[arg(long)]
    provider: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = ServerConfig::from_env();
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(root) = cli.reports_root {
        config.reports_root = root;
    }
    if let Some(root) = cli.repo_root {
        config.repo_root = root;
    }
    if let Some(provider) = cli.provider {
        config.provider = provider;
    }

    scorecard_tokenizer::init();

    let orchestrator =
        Orchestrator::from_env(config.clone()).context("Orchestrator initialization failed")?;
    let app = http::router(orchestrator);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Cannot bind {}", config.bind))?;
    log::info!("Serving analysis API on http://{}", config.bind);

    axum::serve(listener, app).await?;

    scorecard_tokenizer::shutdown();
    Ok(())
}
