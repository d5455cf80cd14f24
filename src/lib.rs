//! Shared plain-text editing server.
//!
//! One in-memory document, one presence list, and a WebSocket endpoint that fans
//! edits and cursor moves out to every other connected client. Edits replace the
//! whole document; whichever arrives at the server last wins.

pub mod config;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod websocket;
pub mod ws;

use std::sync::Arc;
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::Config;
use docs::ApiDoc;
use routes::create_api_routes;
use websocket::websocket_handler;
use ws::HubHandle;

/// State shared by every request and connection
pub struct AppState {
    pub config: Config,
    pub hub: HubHandle,
}

impl AppState {
    /// Build the state and spawn the collaboration hub on the current runtime.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            hub: HubHandle::spawn(),
        }
    }
}

/// Assemble the HTTP router: API, WebSocket endpoint and Swagger UI
pub fn create_app(app_state: Arc<AppState>) -> Router {
    let cors = cors_layer(&app_state.config);

    Router::new()
        .nest("/api", create_api_routes())
        .route("/ws", get(websocket_handler))
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins = config.cors_origin_list();
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(allow_origin)
}
