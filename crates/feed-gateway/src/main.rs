use tracing::info;

use feed_gateway::config::FeedConfig;
use feed_gateway::dispatcher::Dispatcher;

/// Headless listener: logs every forwarded record instead of displaying it.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feed=debug,tower_http=debug".into()),
        )
        .init();

    let config = FeedConfig::from_env()?;
    let (dispatcher, mut rx) = Dispatcher::new();

    tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            let id = payload.get("id").and_then(|v| v.as_str()).unwrap_or("?");
            let channel = payload.get("channel").and_then(|v| v.as_str()).unwrap_or("?");
            info!("Record {} from channel {}", id, channel);
        }
    });

    feed_gateway::server::serve(&config, dispatcher).await
}
