mod api;
mod cli;
mod live;
mod router;
mod state;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vitasense_core::Config;
use vitasense_llm::{AnalysisClient, LlmAnalysisClient, UnconfiguredClient};
use vitasense_monitor::Monitor;
use vitasense_notify::Dispatcher;
use vitasense_storage::FileStore;

use crate::cli::{Cli, Command, ServeArgs};
use crate::state::AppState;

fn build_client(config: &Config) -> Arc<dyn AnalysisClient> {
    if !config.llm.is_configured() {
        warn!(
            provider = %config.llm.provider,
            "LLM provider not configured; readings will stream without analysis"
        );
        return Arc::new(UnconfiguredClient::new(format!(
            "provider '{}' has no credentials",
            config.llm.provider
        )));
    }

    match LlmAnalysisClient::from_config(&config.llm, &config.ollama) {
        Ok(client) => {
            info!(provider = client.provider_name(), "analysis client ready");
            Arc::new(client)
        }
        Err(e) => {
            warn!(error = %e, "failed to create LLM provider; analysis disabled");
            Arc::new(UnconfiguredClient::new(e.to_string()))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.log_summary();

    let store = FileStore::new(&config.storage.data_dir).with_context(|| {
        format!("failed to open data dir {}", config.storage.data_dir.display())
    })?;

    let dispatcher = Dispatcher::from_config(&config.alerts);
    info!(channels = ?dispatcher.channel_names(), "alert channels ready");

    let monitor = Monitor::builder(build_client(&config), Arc::new(store))
        .sensor(config.sensor.clone())
        .analysis(config.analysis.clone())
        .sound(Arc::new(dispatcher))
        .build();
    monitor.start().await?;

    let state = Arc::new(AppState::new(monitor.clone(), config.redacted_summary()));
    let app = router::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vitasense_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Scenarios => cli::print_scenarios(),
        Command::Serve(args) => {
            args.apply(&mut config);
            serve(config).await?;
        }
    }

    Ok(())
}
