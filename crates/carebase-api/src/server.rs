//! HTTP server lifecycle.

use std::future::Future;

use tokio::net::TcpListener;
use tracing::{error, info};

use carebase_contracts::error::{CarebaseError, CarebaseResult};

use crate::config::Settings;
use crate::context::ApiContext;
use crate::router::api_router;

/// Build the context from `settings`, bind, and serve until Ctrl-C.
pub async fn run(settings: Settings) -> CarebaseResult<()> {
    let bind = settings.bind.clone();
    let ctx = ApiContext::from_settings(settings)?;

    let listener = TcpListener::bind(&bind).await.map_err(|e| CarebaseError::Config {
        reason: format!("cannot bind {bind}: {e}"),
    })?;
    let addr = listener.local_addr().map_err(|e| CarebaseError::Config {
        reason: format!("cannot read bound address: {e}"),
    })?;
    info!(
        addr = %addr,
        project = %ctx.settings.project_name,
        symptoms = ctx.advisor.symptom_count(),
        "server listening"
    );

    serve_with_shutdown(listener, ctx, shutdown_signal()).await
}

/// Serve on an already bound listener until `signal` resolves.
pub async fn serve_with_shutdown<F>(listener: TcpListener, ctx: ApiContext, signal: F) -> CarebaseResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = api_router(ctx);
    axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await
        .map_err(|e| {
            error!("server error: {e}");
            CarebaseError::Config {
                reason: format!("server stopped: {e}"),
            }
        })?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("cannot listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
