use anyhow::Result;
use tracing::info;

use memofee_core::AppConfig;

pub async fn run(mut config: AppConfig, port: Option<u16>) -> Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
    };

    memofee_server::serve(&config, shutdown).await?;
    Ok(())
}
