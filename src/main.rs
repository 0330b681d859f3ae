use std::error::Error;

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_console::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Variables may come from the real environment; only a broken .env fails.
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err.into());
        }
    }

    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("warn", Level::WARN))
        .with(telemetry::layer())
        .init();

    chat_console::start().await?;

    Ok(())
}
