use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use deepresearch_relay::{api, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let default_filter = if config.dev_mode {
        "deepresearch_relay=debug,tower_http=debug"
    } else {
        "deepresearch_relay=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        dev_mode = config.dev_mode,
        "starting deep-research relay"
    );

    api::serve(config).await
}
