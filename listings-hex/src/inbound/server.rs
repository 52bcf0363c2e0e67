//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use listings_types::PaymentGateway;

use super::auth::{admin_auth_middleware, hash_admin_key};
use super::handlers::{self, AppState};
use crate::service::{FeaturedListingService, Store};

/// HTTP Server for the directory API.
pub struct HttpServer<R: Store, G: PaymentGateway> {
    state: Arc<AppState<R, G>>,
}

impl<R: Store, G: PaymentGateway> HttpServer<R, G> {
    /// Creates a new HTTP server around a shared service. Admin routes
    /// require `admin_key` as a Bearer token.
    pub fn new(service: Arc<FeaturedListingService<R, G>>, admin_key: &str) -> Self {
        Self {
            state: Arc::new(AppState {
                service,
                admin_key_hash: hash_admin_key(admin_key),
            }),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        // Build HTTP metrics layer (uses globally set MeterProvider)
        let metrics = axum_otel_metrics::HttpMetricsLayerBuilder::new().build();

        let admin = Router::new()
            .route(
                "/payments/feature",
                post(handlers::feature_listing::<R, G>),
            )
            .route("/payments/sweep", post(handlers::sweep_expired::<R, G>))
            .route("/payments/{reference}", get(handlers::get_payment::<R, G>))
            .route(
                "/listings/{id}/payments",
                get(handlers::list_listing_payments::<R, G>),
            )
            .route(
                "/listings/{id}/verify",
                put(handlers::toggle_verified::<R, G>),
            )
            .route_layer(middleware::from_fn_with_state(
                self.state.clone(),
                admin_auth_middleware::<R, G>,
            ));

        Router::new()
            .route("/health", get(handlers::health))
            .route("/api-docs/openapi.json", get(handlers::openapi_json))
            .route("/api/listings", post(handlers::create_listing::<R, G>))
            .route("/api/listings/{id}", get(handlers::get_listing::<R, G>))
            .route("/api/mpesa/callback", post(handlers::mpesa_callback::<R, G>))
            .nest("/api/admin", admin)
            .layer(metrics)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
