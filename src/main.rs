use std::sync::Arc;

use inbox_triage::{
    api::build_router,
    classifier::{Classifier, Taxonomy},
    config::{AppConfig, LoggingConfig},
    ingest::IngestClient,
    mail::ImapMailSource,
    poller::{spawn_poller, Pipeline},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::var("TRIAGE_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = AppConfig::load(&config_path)?;

    init_tracing(&config.logging);
    info!("Starting inbox-triage {}", env!("CARGO_PKG_VERSION"));

    let taxonomy = match &config.taxonomy.path {
        Some(path) => {
            info!("Using taxonomy from {}", path.display());
            Taxonomy::from_file(path)?
        }
        None => Taxonomy::default(),
    };

    let pipeline = Pipeline {
        source: Arc::new(ImapMailSource::new(config.mailbox.clone())?),
        classifier: Arc::new(Classifier::new(taxonomy)),
        ingest: Arc::new(IngestClient::new(config.ingest.clone())?),
        mark_read: config.poller.mark_read,
    };

    let poller = spawn_poller(pipeline, config.poller.interval());

    let listener = tokio::net::TcpListener::bind(config.server.bind_address()).await?;
    info!("Health endpoint listening on {}", config.server.bind_address());

    axum::serve(listener, build_router())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await?;

    poller.abort();
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
