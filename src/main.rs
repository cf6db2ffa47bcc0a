use std::sync::Arc;

use mood_mixer::{
    MoodMixer,
    config::AppConfig,
    errors::Result,
    secrets::ChainedSecretProvider,
    server,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AppConfig::load()?;
    let secrets = ChainedSecretProvider::from_config(&config.secrets)?;
    info!(providers = ?secrets.labels(), "secret providers configured");

    let mixer = Arc::new(MoodMixer::from_config(&config, &secrets).await?);

    server::run_server(config.server.bind_addr, mixer).await?;

    info!("mood mixer stopped");
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .compact()
        .init();

    info!("tracing initialized");
}
