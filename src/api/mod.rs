//! Read-only HTTP API over stored readings
//!
//! ## Endpoints
//!
//! - `GET /api/v1/health` - Liveness plus storage health
//! - `GET /api/v1/readings/latest` - Most recent stored reading (gauge)
//! - `GET /api/v1/check` - Alerts the latest stored reading would raise (nothing is sent)

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{CheckResponse, HealthResponse};

use std::net::SocketAddr;

use axum::http::{HeaderValue, Method, header};
use axum::{Router, routing::get};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ApiConfig;

/// Build the router with CORS and optional token auth applied
pub fn router(config: &ApiConfig, state: ApiState) -> anyhow::Result<Router> {
    let mut app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route(
            "/api/v1/readings/latest",
            get(routes::readings::latest_reading),
        )
        .route("/api/v1/check", get(routes::readings::check_latest))
        .with_state(state);

    if let Some(token) = config.auth_token.clone() {
        app = app.route_layer(axum::middleware::from_fn_with_state(
            token,
            middleware::auth::auth_middleware,
        ));
    }

    let allow_origin = match config.allow_origin.as_str() {
        "*" => AllowOrigin::any(),
        origin => AllowOrigin::exact(
            HeaderValue::from_str(origin)
                .map_err(|e| anyhow::anyhow!("invalid allow_origin {origin:?}: {e}"))?,
        ),
    };

    let cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Ok(app.layer(TraceLayer::new_for_http()).layer(cors))
}

/// Spawn the API server in a background task and return its bound address
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(&config, state)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
