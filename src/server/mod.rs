//! A minimal ops surface: a single `/healthz` endpoint reporting
//! scheduler liveness, standing in for the teacher's full fee-serving
//! API (spec.md's Non-goals exclude a query API, but a process this
//! long-lived still needs something a load balancer or orchestrator
//! can poll).
pub mod health;

use axum::{response::IntoResponse, routing::get, Extension, Router};
use health::IndexerHealth;
use std::{net::SocketAddr, sync::Arc};
use tracing::info;

use crate::health::HealthCheckable;

pub async fn serve(health: Arc<IndexerHealth>, port: u16) -> anyhow::Result<()> {
    let app = Router::new()
        .route(
            "/healthz",
            get(|state: Extension<Arc<IndexerHealth>>| async move { state.health_status().into_response() }),
        )
        .layer(Extension(health));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "ops server listening");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
