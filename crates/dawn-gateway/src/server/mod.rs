//! Gateway server setup
//!
//! Routes, middleware, and the process lifecycle: connect backends, serve
//! until a shutdown signal, then stop workers and the bridge.

mod backends;
mod cors;
mod handler;
mod state;

pub use backends::Backends;
pub use cors::cors_layer;
pub use handler::{gateway_handler, HandshakeQuery};
pub use state::GatewayState;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use dawn_common::{AppConfig, AppError, JwtService};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::bridge::BridgeStatus;
use crate::workers::Workers;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub pubsub: BridgeStatus,
    pub connections: usize,
}

/// Health check endpoint
async fn health_check(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        pubsub: state.bridge().status(),
        connections: state.connections().connection_count(),
    })
}

/// Build the complete application
pub fn create_app(state: GatewayState, config: &AppConfig) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors, config.app.env.is_production()))
        .with_state(state)
}

/// Serve until `shutdown` resolves
///
/// # Errors
/// Fails if the listener cannot be accepted on.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<(), AppError>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(AppError::internal)
}

/// Run the complete gateway with configuration
///
/// # Errors
/// Fails if the database is configured but unreachable, or the address
/// cannot be bound.
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let backends = Backends::from_config(&config).await?;
    let state = backends
        .into_state(JwtService::new(&config.jwt.secret), config.realtime.clone())
        .await;

    let workers = Workers::spawn(&state);
    let app = create_app(state.clone(), &config);

    let addr = config.gateway.address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(anyhow::Error::new(e).context(format!("failed to bind to {addr}"))))?;

    tracing::info!(
        pubsub = %state.bridge().status(),
        "Gateway listening on ws://{}/gateway",
        addr
    );

    let result = serve(listener, app, wait_for_shutdown_signal()).await;

    tracing::info!("Shutting down gateway");
    workers.shutdown(&state).await;
    state.bridge().shutdown().await;

    result
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                tracing::warn!("Failed to register signal handlers, falling back to Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
