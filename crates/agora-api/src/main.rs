//! agora-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `AGORA_*`
//! environment overrides, seeds an in-memory store, and serves the forum
//! API over HTTP.

use std::{path::PathBuf, sync::Arc};

use agora_api::{
  AppState, ServerConfig,
  providers::{
    AssistantClient, ContextClient, FileStore, Providers, WebhookNotifier,
  },
  session::SessionStore,
};
use agora_store_memory::MemoryStore;
use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Agora forum backend")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("AGORA"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  tokio::fs::create_dir_all(&server_cfg.upload_dir)
    .await
    .with_context(|| {
      format!("failed to create upload dir {:?}", server_cfg.upload_dir)
    })?;

  let providers = Providers {
    assistant: server_cfg
      .assistant_url
      .clone()
      .map(AssistantClient::new)
      .transpose()?,
    context: server_cfg
      .context_url
      .clone()
      .map(ContextClient::new)
      .transpose()?,
    notifier: server_cfg
      .webhook_url
      .clone()
      .map(WebhookNotifier::new)
      .transpose()?,
    files: FileStore::new(server_cfg.upload_dir.clone()),
  };

  let state = AppState {
    store:     Arc::new(MemoryStore::new()),
    sessions:  Arc::new(SessionStore::new()),
    providers: Arc::new(providers),
    config:    Arc::new(server_cfg.clone()),
  };

  let app = agora_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
