use anyhow::{Context, Result};
use axum::Router;
use axum_server::Handle;
use dwaste_domain::config::ServerConfig;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

/// How long in-flight requests get to finish under a process host.
const GRACEFUL_SHUTDOWN: Duration = Duration::from_secs(30);

/// Development listener: announces itself and stops at the first signal.
pub(crate) async fn standalone(router: Router, server: &ServerConfig) -> Result<()> {
    let address = resolve(server).await?;

    info!(
        host = %server.host,
        port = server.port,
        "Starting development server at http://{}/api/",
        server.server_name
    );

    let handle = Handle::<SocketAddr>::new();
    spawn_shutdown_listener(handle.clone(), None);
    serve(router, address, handle).await
}

/// Production listener: the host owns the lifecycle, so drain connections before exiting.
pub(crate) async fn hosted(router: Router, server: &ServerConfig) -> Result<()> {
    let address = resolve(server).await?;
    info!(address = %address, "Serving under process host");

    let handle = Handle::<SocketAddr>::new();
    spawn_shutdown_listener(handle.clone(), Some(GRACEFUL_SHUTDOWN));
    serve(router, address, handle).await
}

async fn serve(router: Router, address: SocketAddr, handle: Handle<SocketAddr>) -> Result<()> {
    axum_server::bind(address)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .with_context(|| format!("HTTP server on {address} failed"))?;

    info!("Server shutdown complete");
    Ok(())
}

async fn resolve(server: &ServerConfig) -> Result<SocketAddr> {
    if let Ok(ip) = server.host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, server.port));
    }

    tokio::net::lookup_host((server.host.as_str(), server.port))
        .await
        .with_context(|| format!("Cannot resolve FLASK_HOST '{}'", server.host))?
        .next()
        .with_context(|| format!("FLASK_HOST '{}' has no addresses", server.host))
}

fn spawn_shutdown_listener(handle: Handle<SocketAddr>, grace: Option<Duration>) {
    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            error!("Error while waiting for shutdown signal: {e}");
            return;
        }

        match grace {
            Some(timeout) => {
                info!("Shutdown signal received, starting graceful shutdown...");
                handle.graceful_shutdown(Some(timeout));
            },
            None => {
                info!("Shutdown signal received, stopping development server");
                handle.shutdown();
            },
        }
    });
}

/// Listens for shutdown signals (Ctrl+C, SIGTERM).
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }

    Ok(())
}
