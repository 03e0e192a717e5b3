use std::process;
use std::sync::Arc;

use pdfsmith::{Config, Error, PdfService, run_with_shutdown};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(error) = run().await {
        tracing::error!(error = %error, "service failed");
        process::exit(1);
    }
}

async fn run() -> Result<(), Error> {
    let config = Config::from_env()?;
    let service = Arc::new(PdfService::new(config).await?);

    let reaper = service.start_reaper();
    let api = service.spawn_api_server();

    run_with_shutdown(&service).await?;

    // Both tasks watch the shutdown token and exit on their own
    reaper
        .await
        .map_err(|e| Error::ApiServerError(format!("reaper task panicked: {e}")))?;
    api.await
        .map_err(|e| Error::ApiServerError(format!("API task panicked: {e}")))??;

    Ok(())
}
