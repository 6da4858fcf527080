//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the plugin endpoint and admin routes
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Serve on a listener until shutdown is signalled

use axum::{routing::post, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    map_response_body::MapResponseBodyLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::acl::AclStore;
use crate::admin::setup_admin_router;
use crate::config::{AdminConfig, PluginConfig};
use crate::plugin::handler::handle_plugin;
use crate::plugin::{Dispatcher, PolicyEvaluator};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AclStore>,
    pub dispatcher: Arc<Dispatcher>,
    pub admin: Arc<AdminConfig>,
}

impl AppState {
    pub fn new(store: Arc<AclStore>, admin: AdminConfig) -> Self {
        let dispatcher = Dispatcher::new(PolicyEvaluator::new(store.clone()));
        Self {
            store,
            dispatcher: Arc::new(dispatcher),
            admin: Arc::new(admin),
        }
    }
}

/// HTTP server for the plugin and admin API.
pub struct HttpServer {
    router: Router,
    config: PluginConfig,
}

impl HttpServer {
    /// Create a new HTTP server over an opened token store.
    pub fn new(config: PluginConfig, store: Arc<AclStore>) -> Self {
        let state = AppState::new(store, config.admin.clone());
        let router = build_router(&config, state);
        Self { router, config }
    }

    /// Run the server until `shutdown` fires or the process is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            admin = self.config.admin.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => tracing::info!("Shutdown requested"),
                    _ = crate::lifecycle::signals::shutdown_signal() => {}
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// The assembled router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &PluginConfig, state: AppState) -> Router {
    let mut router = Router::new()
        .route("/handler", post(handle_plugin))
        .with_state(state.clone());

    if config.admin.enabled {
        router = router.merge(setup_admin_router(state));
    }

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(MapResponseBodyLayer::new(axum::body::Body::new))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size)),
    )
}
