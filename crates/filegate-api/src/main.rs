use filegate_api::setup::{initialize_app, server::start_server};
use filegate_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (state, router) = initialize_app(&config).await?;

    start_server(&config, state, router).await?;

    Ok(())
}
