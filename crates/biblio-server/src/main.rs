//! biblio-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `BIBLIO_`-prefixed environment variables, honours the bare `PORT` and
//! `DATABASE_URL` overrides, runs schema init and the optional seed, then
//! serves HTTP with the job runner alongside.

use std::path::PathBuf;

use anyhow::Context as _;
use biblio_jobs::{runner::Runner, HandlerRegistry};
use biblio_server::{router, AppState, ServerConfig};
use biblio_store_postgres::PgStore;
use clap::Parser;
use tokio::{net::TcpListener, sync::watch};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Biblio library-commerce server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Apply a JSON seed file (books and opening float) before serving.
  #[arg(long)]
  seed: Option<PathBuf>,
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
    .add_source(config::Environment::with_prefix("BIBLIO"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // The bare variables win over the file for deployment ergonomics.
  let port = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse().ok())
    .unwrap_or(server_cfg.port);
  let database_url = std::env::var("DATABASE_URL")
    .ok()
    .or(server_cfg.database_url.clone())
    .context("DATABASE_URL is not set")?;

  // Open the store and bring the schema up.
  let store = PgStore::connect(&database_url).context("invalid DATABASE_URL")?;
  store
    .init_schema()
    .await
    .context("failed to initialise database schema")?;

  if let Some(seed_path) = &cli.seed {
    let inserted = biblio_server::seed::apply(&store, seed_path)
      .await
      .map_err(|e| anyhow::anyhow!("seed failed: {e}"))?;
    tracing::info!(inserted, "seed file applied");
  }

  // Start the job runner alongside the HTTP server.
  let (shutdown_tx, shutdown_rx) = watch::channel(false);
  let runner = Runner::new(store.clone(), HandlerRegistry::standard());
  let runner_task = tokio::spawn(runner.run(shutdown_rx));

  let app = router(AppState { store });
  let address = format!("{}:{}", server_cfg.host, port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(async {
      let _ = tokio::signal::ctrl_c().await;
    })
    .await
    .context("server error")?;

  // Stop the runner and wait for the in-flight tick to finish.
  let _ = shutdown_tx.send(true);
  let _ = runner_task.await;

  Ok(())
}
