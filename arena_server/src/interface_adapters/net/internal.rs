// HTTP handlers for room control and history queries.

use crate::domain::{Cell, Layout, LayoutError, SimTuning, SpawnPoint};
use crate::interface_adapters::http::{ApiError, error_response, map_registry_error};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{
    ConnectionId, MatchHistory, RoomConfig, RoomStatus, RoomSummary, WaiterInfo,
};

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use std::{sync::Arc, time::Duration};
use tracing::info;

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// Optional overrides for the simulation tuning.
#[derive(Debug, Default, serde::Deserialize)]
pub struct TuningRequest {
    initial_length: Option<usize>,
    doodah_count: Option<usize>,
    doodah_reward: Option<u32>,
}

#[derive(Debug, serde::Deserialize)]
pub struct CreateRoomRequest {
    // Optional room id; when omitted the server assigns the next number.
    #[serde(default)]
    room_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    // ASCII rows; mutually exclusive with width/height.
    #[serde(default)]
    layout: Option<Vec<String>>,
    #[serde(default)]
    width: Option<usize>,
    #[serde(default)]
    height: Option<usize>,
    #[serde(default)]
    walls: Vec<Cell>,
    #[serde(default)]
    spawns: Vec<SpawnPoint>,
    #[serde(default)]
    tuning: TuningRequest,
    // 0 waits for every intent; absent uses the server default.
    #[serde(default)]
    tick_timeout_ms: Option<u64>,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Debug, serde::Deserialize)]
pub struct SubscribeRequest {
    connection_id: ConnectionId,
}

#[derive(Debug, serde::Serialize)]
pub struct MembershipResponse {
    connection_id: ConnectionId,
    room_id: String,
}

fn build_layout(payload: &CreateRoomRequest) -> Result<Layout, ApiError> {
    let layout = match (&payload.layout, payload.width, payload.height) {
        (Some(rows), None, None) => {
            if !payload.walls.is_empty() || !payload.spawns.is_empty() {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    "walls and spawns are encoded in the layout rows",
                ));
            }
            Layout::from_ascii(rows.as_slice())
        }
        (None, Some(width), Some(height)) => Layout::new(
            width,
            height,
            payload.walls.clone(),
            payload.spawns.clone(),
        ),
        _ => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "either layout or width and height is required",
            ));
        }
    };
    layout.map_err(|err: LayoutError| error_response(StatusCode::BAD_REQUEST, err.to_string()))
}

fn build_config(payload: CreateRoomRequest, default_timeout: Option<Duration>) -> Result<RoomConfig, ApiError> {
    let layout = build_layout(&payload)?;

    let defaults = SimTuning::default();
    let tuning = SimTuning {
        initial_length: payload.tuning.initial_length.unwrap_or(defaults.initial_length),
        doodah_count: payload.tuning.doodah_count.unwrap_or(defaults.doodah_count),
        doodah_reward: payload.tuning.doodah_reward.unwrap_or(defaults.doodah_reward),
    };
    if tuning.initial_length == 0 {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "initial_length must be at least 1",
        ));
    }
    if tuning.initial_length > layout.width() * layout.height() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "initial_length must fit on the grid",
        ));
    }

    let name = payload
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Custom".to_string());
    let mut config = RoomConfig::new(name, layout);
    config.description = payload.description.unwrap_or_default();
    config.tuning = tuning;
    config.tick_timeout = match payload.tick_timeout_ms {
        None => default_timeout,
        Some(0) => None,
        Some(millis) => Some(Duration::from_millis(millis)),
    };
    config.seed = payload.seed;
    Ok(config)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummary>> {
    Json(state.arena.list_rooms().await)
}

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(mut payload): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomStatus>), ApiError> {
    let room_id = match payload.room_id.take() {
        Some(room_id) => {
            let room_id = room_id.trim().to_string();
            if room_id.is_empty() {
                return Err(error_response(StatusCode::BAD_REQUEST, "room_id must not be blank"));
            }
            Some(room_id)
        }
        None => None,
    };
    let config = build_config(payload, state.arena.settings().default_tick_timeout)?;

    let status = state
        .arena
        .create_room(room_id, config)
        .await
        .map_err(map_registry_error)?;
    Ok((StatusCode::CREATED, Json(status)))
}

pub async fn room_status(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomStatus>, ApiError> {
    state
        .arena
        .room_status(&room_id)
        .await
        .map(Json)
        .map_err(map_registry_error)
}

pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<Json<MembershipResponse>, ApiError> {
    state
        .arena
        .subscribe(payload.connection_id, &room_id)
        .await
        .map_err(map_registry_error)?;
    Ok(Json(MembershipResponse {
        connection_id: payload.connection_id,
        room_id,
    }))
}

pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Path(connection_id): Path<ConnectionId>,
) -> Result<Json<MembershipResponse>, ApiError> {
    let room_id = state
        .arena
        .unsubscribe(connection_id)
        .await
        .map_err(map_registry_error)?;
    Ok(Json(MembershipResponse {
        connection_id,
        room_id: room_id.to_string(),
    }))
}

pub async fn start_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomStatus>, ApiError> {
    let status = state
        .arena
        .start(&room_id)
        .await
        .map_err(map_registry_error)?;
    info!(room_id = %room_id, members = status.members.len(), "room started");
    Ok(Json(status))
}

pub async fn reset_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomStatus>, ApiError> {
    state
        .arena
        .reset(&room_id)
        .await
        .map(Json)
        .map_err(map_registry_error)
}

pub async fn room_history(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<MatchHistory>, ApiError> {
    state
        .arena
        .history(&room_id)
        .await
        .map(Json)
        .map_err(map_registry_error)
}

pub async fn waiting(State(state): State<Arc<AppState>>) -> Json<Vec<WaiterInfo>> {
    Json(state.arena.waiters().await)
}
