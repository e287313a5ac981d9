//! leserve binary entry point

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::var("LESERVE_CONFIG") {
        Ok(path) => leserve::ServerConfig::load(path)?.with_env(),
        Err(_) => leserve::ServerConfig::from_env(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        backend = %config.gateway.backend_url,
        uploads = %config.gateway.upload_url,
        "LeServe - LeDossier proposal journey"
    );

    let server = leserve::LeServeServer::new(config)?;
    info!("Server starting on: {}", server.server_url());
    server.start().await?;

    Ok(())
}
