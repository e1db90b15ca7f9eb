use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use academy_api::app::{AppServices, build_app};
use academy_api::server;
use academy_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    academy_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = Arc::new(AppServices::from_config(&config).await?);
    let app = build_app(services.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        mode = config.mode.as_str(),
        store = services.store_backend(),
        mail = services.mail_transport(),
        static_dir = config.static_dir.as_deref().unwrap_or("-"),
        "listening on {}",
        listener.local_addr()?
    );

    server::serve(listener, app, server::shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}
