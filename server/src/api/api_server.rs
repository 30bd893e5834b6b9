//! HTTP server implementation for the Pokedex API

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use std::{future::Future, net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::api_handlers;
use pokedex_core::constants::COLLECTION_PATH;
use pokedex_core::core::{AppState, ConfiguredAppState};
use pokedex_core::StorageImpl;

/// Creates the application router with all routes and middleware
pub fn create_router<B: StorageImpl>(app_state: Arc<AppState<B>>) -> Router {
    // CORS configuration - permissive
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(Any)
        .allow_credentials(false);

    let item_path = format!("{}/{{id}}", COLLECTION_PATH);

    let mut router = Router::new()
        // Collection routes
        .route(
            COLLECTION_PATH,
            post(api_handlers::create_pokemon::<B>)
                .get(api_handlers::list_pokemons::<B>)
                .delete(api_handlers::delete_all_pokemons::<B>),
        )
        .route(
            &item_path,
            get(api_handlers::get_pokemon::<B>)
                .put(api_handlers::update_pokemon::<B>)
                .delete(api_handlers::delete_pokemon::<B>),
        )
        // System routes
        .route("/health", get(api_handlers::health_check));

    // Anything outside the API falls through to the static directory
    match &app_state.config.server.static_dir {
        Some(dir) if dir.is_dir() => {
            info!("Serving static files from {}", dir.display());
            router = router.fallback_service(ServeDir::new(dir));
        }
        Some(dir) => warn!("Static directory {} not found, static serving disabled", dir.display()),
        None => {}
    }

    router
        // Apply middleware to ALL routes
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(app_state)
}

/// Bind the listener and serve until `shutdown` resolves
async fn serve_api_server_with_app<F>(addr: SocketAddr, app: Router, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", listener.local_addr()?);
    info!("Pokemon API available at http://{}{}", addr, COLLECTION_PATH);
    info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

    info!("HTTP server stopped");
    Ok(())
}

/// Start the HTTP server with the configured AppState
pub async fn start_api_server<F>(configured_app_state: &ConfiguredAppState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let http_addr = configured_app_state.http_addr();

    info!("Starting Pokedex API server on {}", http_addr);

    // Match once on storage type to get concrete AppState, then start server
    match configured_app_state {
        ConfiguredAppState::Memory { app_state, .. } => {
            info!("Starting server with MemoryBackend");
            let app = create_router(Arc::new(app_state.clone()));
            serve_api_server_with_app(http_addr, app, shutdown).await
        }
        ConfiguredAppState::Disk { app_state, .. } => {
            info!("Starting server with DiskBackend");
            let app = create_router(Arc::new(app_state.clone()));
            serve_api_server_with_app(http_addr, app, shutdown).await
        }
    }
}
