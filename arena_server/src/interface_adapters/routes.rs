use crate::interface_adapters::net::internal::{
    create_room, health, list_rooms, reset_room, room_history, room_status, start_room, subscribe,
    unsubscribe, waiting,
};
use crate::interface_adapters::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/{room_id}", get(room_status))
        .route("/rooms/{room_id}/subscribe", post(subscribe))
        .route("/rooms/{room_id}/start", post(start_room))
        .route("/rooms/{room_id}/reset", post(reset_room))
        .route("/rooms/{room_id}/history", get(room_history))
        .route(
            "/connections/{connection_id}/unsubscribe",
            post(unsubscribe),
        )
        .route("/waiting", get(waiting))
        .with_state(state)
}
