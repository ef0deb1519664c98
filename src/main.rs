mod bot;

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use upbit_scout::config::Config;
use upbit_scout::exchange::UpbitClient;

use crate::bot::ScoutBot;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .init();

    let market = Box::new(UpbitClient::new(&cfg));
    let shared_config = cfg.shared();

    let mut bot = ScoutBot::new(shared_config, market).await;
    bot.run().await?;

    Ok(())
}
