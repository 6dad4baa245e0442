//! Server lifecycle: connect the bridge, serve until shutdown, tear down.

use std::future::Future;
use std::io;
use std::sync::Arc;

use axum::Router;
use mtbridge_core::{LifecycleBridge, SessionCapability};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::routes::{router, GatewayState};

/// Build the application router for `bridge` under `config`.
pub fn app<S: SessionCapability + 'static>(
    config: &ServerConfig,
    bridge: Arc<LifecycleBridge<S>>,
) -> Router {
    router(GatewayState::new(bridge, config))
}

/// Bind `config.host:config.port` and serve.
pub async fn serve<S, F>(
    config: &ServerConfig,
    bridge: Arc<LifecycleBridge<S>>,
    shutdown: F,
) -> io::Result<()>
where
    S: SessionCapability + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    serve_on(listener, config, bridge, shutdown).await
}

/// Serve on an already bound listener.
///
/// The session is connected before the first request is accepted. A
/// failed connect is logged and the gateway still starts: commands then
/// fail with `not_connected` until the terminal becomes reachable.
pub async fn serve_on<S, F>(
    listener: TcpListener,
    config: &ServerConfig,
    bridge: Arc<LifecycleBridge<S>>,
    shutdown: F,
) -> io::Result<()>
where
    S: SessionCapability + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let connector = Arc::clone(&bridge);
    match tokio::task::spawn_blocking(move || connector.connect()).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(detail = err.detail(), "starting without a terminal session"),
        Err(err) => warn!(error = %err, "connect task failed"),
    }

    let addr = listener.local_addr()?;
    info!(%addr, error_status = ?config.error_status, "gateway listening");

    let app = app(config, Arc::clone(&bridge));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("gateway stopped, closing terminal session");
    let closer = Arc::clone(&bridge);
    match tokio::task::spawn_blocking(move || closer.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(detail = err.detail(), "terminal session shutdown failed"),
        Err(err) => warn!(error = %err, "shutdown task failed"),
    }
    Ok(())
}
