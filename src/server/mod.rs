//! # HTTP Server for Card Templates
//!
//! REST API for storing templates and card holders, rendering cards and
//! preparing print output.
//!
//! ## Usage
//!
//! ```bash
//! cardpress serve --listen 0.0.0.0:8080 --data-dir ./data --asset-dir ./public
//! ```
//!
//! ## Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/api/health` | liveness and counts |
//! | GET | `/api/presets` | background presets, paper and card sizes |
//! | GET, POST, PUT | `/api/templates` | list, create, save by name |
//! | GET, DELETE | `/api/templates/:id` | fetch, delete |
//! | GET | `/api/templates/name/:name` | fetch by name |
//! | GET | `/api/templates/name/:name/render` | render a saved template |
//! | GET, POST | `/api/users` | list (paged, searchable), create |
//! | GET, PUT, DELETE | `/api/users/:id` | fetch, update, delete |
//! | GET | `/api/users/name/:name` | fetch by field value |
//! | POST | `/api/render` | render a template to PNG/JPEG |
//! | POST | `/api/print/html` | browser print page |
//! | POST | `/api/print/sheet` | tiled print sheet |
//! | POST | `/api/print/fields` | data-entry form for a template |
//! | POST | `/api/assets` | image upload to data URL |
//! | GET | `/assets/*path` | files from the asset directory |

mod handlers;
mod response;
mod state;
mod static_files;

pub use response::{ApiError, ApiJson, ApiQuery, Envelope};
pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::CardpressError;

/// Request body limit for JSON endpoints (templates embed data URLs).
const JSON_BODY_LIMIT: usize = 25 * 1024 * 1024;

/// Build the application router around shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/presets", get(handlers::presets))
        // Templates
        .route(
            "/api/templates",
            get(handlers::templates::list)
                .post(handlers::templates::create)
                .put(handlers::templates::save),
        )
        .route(
            "/api/templates/:id",
            get(handlers::templates::get).delete(handlers::templates::delete),
        )
        .route(
            "/api/templates/name/:name",
            get(handlers::templates::get_by_name),
        )
        .route(
            "/api/templates/name/:name/render",
            get(handlers::render::render_saved),
        )
        // Users
        .route(
            "/api/users",
            get(handlers::users::list).post(handlers::users::create),
        )
        .route(
            "/api/users/:id",
            get(handlers::users::get)
                .put(handlers::users::update)
                .delete(handlers::users::delete),
        )
        .route("/api/users/name/:name", get(handlers::users::get_by_name))
        // Rendering and printing
        .route("/api/render", post(handlers::render::render))
        .route("/api/print/html", post(handlers::print::html))
        .route("/api/print/sheet", post(handlers::print::sheet))
        .route("/api/print/fields", post(handlers::print::fields))
        // Uploads
        .route(
            "/api/assets",
            post(handlers::assets::upload)
                .layer(DefaultBodyLimit::max(handlers::assets::MAX_UPLOAD_BYTES)),
        )
        .route("/assets/*path", get(static_files::asset_handler))
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use cardpress::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), cardpress::CardpressError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:8080".to_string(),
///     data_dir: "./data".into(),
///     asset_dir: Some("./public".into()),
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), CardpressError> {
    let listen_addr = config.listen_addr.clone();
    let state = Arc::new(AppState::open(config).await?);

    tracing::info!(
        listen = %listen_addr,
        data_dir = %state.config.data_dir.display(),
        asset_dir = ?state.config.asset_dir,
        "Cardpress HTTP server starting"
    );

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(|e| CardpressError::Transport(format!("Failed to bind to {}: {}", listen_addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CardpressError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown requested");
}
