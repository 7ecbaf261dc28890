use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{focus, health, ws};
use crate::state::AppState;

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origin);

    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/leaderboard", get(focus::leaderboard))
        .route("/snapshot", get(focus::snapshot))
        .route("/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `*` or an unparseable origin allows any origin.
fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::POST]);
    match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) if allowed_origin != "*" => layer.allow_origin(origin),
        _ => {
            tracing::warn!(allowed_origin, "Allowing any CORS origin");
            layer.allow_origin(Any)
        }
    }
}
