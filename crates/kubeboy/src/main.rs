use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kubeboy::{
    agent::{create_chat_agent, ToolRegistry},
    cli,
    config::Config,
    kubernetes::{ClusterQueries, KubeCluster},
};

#[derive(Parser)]
#[command(author, version, about = "Chat with your Kubernetes cluster", long_about = None)]
struct Cli {
    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kubeboy={}", args.log_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = Config::load().context("failed to load configuration")?;
    info!(
        "Loaded configuration: provider={:?} model={}",
        config.llm.provider, config.llm.model
    );

    let cluster = KubeCluster::connect(&config.kube)
        .await
        .context("failed to connect to Kubernetes")?;
    let queries = ClusterQueries::new(Arc::new(cluster), config.queries.clone());
    let registry = Arc::new(ToolRegistry::new(queries));

    let agent = create_chat_agent(&config.llm, registry).context("failed to create chat agent")?;

    // The chat loop blocks on stdin, so Ctrl-C is watched from a worker thread.
    tokio::spawn(async {
        if cli::goodbye_on_interrupt(tokio::signal::ctrl_c(), io::stdout())
            .await
            .is_ok()
        {
            std::process::exit(0);
        }
    });

    cli::run(agent.as_ref(), io::stdin().lock(), io::stdout()).await?;
    Ok(())
}
