use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::config::AppConfig;
use crate::gateway::Gateway;
use crate::routes;
use crate::state::AppState;

/// Bind the configured port and serve until SIGINT/SIGTERM
pub async fn run(config: AppConfig, gateway: Gateway) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let grace = config.server.shutdown_grace;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "Storefront API listening");

    let app = routes::app(AppState::new(config, gateway));
    serve(listener, app, grace, shutdown_signal()).await
}

/// Serve `app` on `listener` until `shutdown` resolves. In-flight requests then
/// get `grace` to finish before the server is abandoned.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    grace: Duration,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let stopping = Arc::new(Notify::new());
    let notify = stopping.clone();

    let mut server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.await;
            notify.notify_one();
        })
        .await
    });

    tokio::select! {
        result = &mut server => {
            result.context("server task panicked")?.context("server failed")?;
            return Ok(());
        }
        _ = stopping.notified() => {}
    }

    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            result.context("server task panicked")?.context("server failed")?;
            tracing::info!("Server stopped");
        }
        Err(_) => {
            tracing::warn!(grace_secs = grace.as_secs(), "Grace period elapsed with requests in flight, forcing shutdown");
            server.abort();
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("SIGTERM received, shutting down"),
                    _ = tokio::signal::ctrl_c() => tracing::info!("SIGINT received, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to register SIGTERM handler, listening for Ctrl-C only");
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("SIGINT received, shutting down");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Ctrl-C received, shutting down");
    }
}
