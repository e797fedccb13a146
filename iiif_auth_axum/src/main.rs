use clap::Parser;
use color_eyre::eyre::WrapErr;
use iiif_auth_axum::{router, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Config::parse();
    tracing::debug!(?config, "loaded configuration");

    let state = config.app_state()?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .wrap_err_with(|| format!("unable to bind {}", config.listen))?;

    tracing::info!(
        listen = %config.listen,
        public_url = %config.public_url,
        "IIIF auth demo listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
