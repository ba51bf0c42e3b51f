use std::sync::{Arc, Mutex};

use claim_workbench::api::ApiClient;
use claim_workbench::auth::EnvTokenProvider;
use claim_workbench::config::Config;
use claim_workbench::mutation::Executor;
use claim_workbench::realtime::{EventCorrelator, RealtimeClient};
use claim_workbench::store::EntityStore;
use claim_workbench::upload::BatchTracker;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Diagnostic tap: connect to a claim's push channel and log every
/// correlated event until interrupted. Useful for verifying credentials
/// and event shapes against a live backend.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "claim_workbench=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let claim_id = match std::env::args().nth(1) {
        Some(id) => id,
        None => {
            eprintln!("usage: workbench-tap <claim-id>");
            std::process::exit(2);
        }
    };

    tracing::info!("Starting workbench tap: claim={}", claim_id);
    tracing::info!("API base: {}", config.api_base_url);
    tracing::info!("Realtime endpoint: {}", config.realtime_url);

    let tokens: Arc<dyn claim_workbench::auth::TokenProvider> = Arc::new(EnvTokenProvider);
    let remote = Arc::new(ApiClient::new(&config.api_base_url, Arc::clone(&tokens))?);

    let store = Arc::new(Mutex::new(EntityStore::new()));
    let tracker = Arc::new(Mutex::new(BatchTracker::new(config.batch_stale_after)));
    let executor = Executor::new(&claim_id, Arc::clone(&store), Arc::clone(&remote));
    let correlator = EventCorrelator::new(Arc::clone(&store), Arc::clone(&tracker));

    let client = RealtimeClient::spawn(
        config,
        &claim_id,
        tokens,
        correlator,
        executor,
        remote,
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");
    client.shutdown().await;

    Ok(())
}
