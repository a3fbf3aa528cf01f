use anyhow::Result;
use pagesmith::{api, Config};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        host = %config.host,
        port = config.port,
        secret_configured = config.shared_secret.is_some(),
        "Pagesmith starting"
    );

    api::serve(config).await
}
