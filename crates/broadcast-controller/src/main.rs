//! Broadcast Controller
//!
//! Stateful WebSocket signaling server for live webinar coordination.
//!
//! One HTTP server exposes:
//! - `GET /ws` - the signaling WebSocket
//! - `GET /health`, `GET /ready` - Kubernetes probes
//! - `GET /metrics` - Prometheus metrics
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Install the Prometheus metrics recorder
//! 3. Connect the Redis session store
//! 4. Spawn the controller actor
//! 5. Bind the listener (fail fast), then serve
//! 6. Wait for Ctrl-C/SIGTERM, flip readiness off, drain rooms

#![warn(clippy::pedantic)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use broadcast_controller::actors::BroadcastControllerHandle;
use broadcast_controller::auth::JwtVerifier;
use broadcast_controller::config::Config;
use broadcast_controller::observability::{health_router, HealthState};
use broadcast_controller::registry::ConnectionRegistry;
use broadcast_controller::relay::SignalRelay;
use broadcast_controller::store::RedisSessionStore;
use broadcast_controller::transport::{signaling_router, AppState};
use common::secret::ExposeSecret;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long to let the controller drain rooms after cancellation.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "broadcast_controller=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Broadcast Controller");

    let config = Config::from_env().context("Failed to load configuration")?;

    info!(
        instance_id = %config.instance_id,
        bind_address = %config.bind_address,
        jwt_clock_skew_seconds = config.jwt_clock_skew_seconds,
        "Configuration loaded successfully"
    );

    // Metrics recorder must be installed before anything records.
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus metrics recorder")?;

    let health_state = Arc::new(HealthState::new());

    info!("Connecting to session store...");
    let store = RedisSessionStore::connect(config.redis_url.expose_secret())
        .await
        .context("Failed to connect to session store")?;
    info!("Session store connection established");

    let verifier = Arc::new(JwtVerifier::new(
        config.jwt_secret.clone(),
        Duration::from_secs(config.jwt_clock_skew_seconds),
    ));

    let registry = Arc::new(ConnectionRegistry::new());

    let controller = BroadcastControllerHandle::new(
        config.instance_id.clone(),
        verifier,
        Arc::new(store),
        Arc::clone(&registry),
    );
    info!("Controller actor started");

    let shutdown_token = controller.child_token();

    let app_state = AppState {
        registry: Arc::clone(&registry),
        controller: controller.clone(),
        relay: SignalRelay::new(Arc::clone(&registry)),
    };

    let metrics_router = Router::new().route(
        "/metrics",
        axum::routing::get(move || {
            let handle = prometheus_handle.clone();
            async move { handle.render() }
        }),
    );

    let app = signaling_router(app_state)
        .merge(health_router(Arc::clone(&health_state)))
        .merge(metrics_router)
        .layer(TraceLayer::new_for_http());

    // Bind before spawning to fail fast on bind errors.
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address))?;
    info!(addr = %config.bind_address, "Listener bound");
    health_state.set_ready();

    let server_shutdown_token = shutdown_token.child_token();
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                server_shutdown_token.cancelled().await;
                info!("Server shutting down");
            })
            .await;
        if let Err(e) = result {
            error!(error = %e, "Server failed");
        }
    });

    info!("Broadcast Controller running - press Ctrl+C to shutdown");
    shutdown_signal().await;

    info!("Shutdown signal received, initiating graceful shutdown...");

    // Stop routing new connections first, then drain.
    health_state.set_not_ready();
    controller.cancel();

    tokio::time::sleep(DRAIN_GRACE).await;
    server.abort();

    info!("Broadcast Controller shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed; without them there is no
/// way to shut down gracefully.
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
