//! Room-scoped WebSocket pub/sub relay, with an optional embedded TURN server.

pub mod config;
pub mod hub;
pub mod turn_server;
mod ws_handler;

pub use config::RelayArgs;
pub use hub::TopicHub;
pub use turn_server::{TurnConfig, TurnHandle, start_turn};
pub use ws_handler::topic_ws_handler;

use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// HTTP routes of the relay: `/health` and `/topics/{topic}`.
pub fn router(hub: TopicHub) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/topics/{topic}", get(topic_ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(hub)
}
