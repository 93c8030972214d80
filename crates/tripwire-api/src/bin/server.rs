//! tripwire server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), assembles an
//! in-memory backed engine, and serves the JSON API over HTTP.
//!
//! The in-memory backend is suitable for demos and local development; a
//! production deployment supplies its own `DocumentIndex`, `ServiceRegistry`,
//! and `JobSubmitter` implementations and mounts the same router.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tripwire_api::ServerConfig;
use tripwire_engine::Workflow;
use tripwire_index_mem::{
  MemIndex, RecordingJobSubmitter, StaticServiceRegistry,
};

#[derive(Parser)]
#[command(author, version, about = "Tripwire event-condition-action server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("TRIPWIRE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Assemble the engine over the in-memory backend. The unreachable registry
  // makes the trigger store skip its service existence probe.
  let workflow = Arc::new(Workflow::new(
    Arc::new(MemIndex::new()),
    Arc::new(StaticServiceRegistry::unreachable()),
    Arc::new(RecordingJobSubmitter::new()),
  ));

  let app = tripwire_api::api_router(workflow);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
