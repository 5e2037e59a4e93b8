use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use budget_planner::{api, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "budget_planner=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(?config, "starting budget planner");

    api::serve(config).await
}
