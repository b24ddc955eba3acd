use std::sync::Arc;

use spendwise_api::SpendWiseClient;

use spendwise_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), spendwise_core::Error> {
    spendwise_core::logging::init("spendwise")?;
    tracing::info!("starting SpendWise Telegram bridge");

    let cfg = Arc::new(Config::load()?);
    let backend = Arc::new(SpendWiseClient::from_config(&cfg)?);

    spendwise_telegram::router::run_webhook(cfg, backend)
        .await
        .map_err(|e| spendwise_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
