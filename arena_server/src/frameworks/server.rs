// Framework bootstrap for the arena server runtime.

use crate::domain::layouts::presets;
use crate::frameworks::config;
use crate::interface_adapters::net::{SessionSettings, serve_clients};
use crate::interface_adapters::routes;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{Arena, ArenaSettings, RoomConfig};

use std::net::SocketAddr;
use std::{io::Result, sync::Arc, time::Duration};
use tokio::net::TcpListener;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Serves game clients on `tcp_listener` and the control API on `http_listener`.
pub async fn run(tcp_listener: TcpListener, http_listener: TcpListener) -> Result<()> {
    let tcp_address = tcp_listener.local_addr()?;
    let http_address = http_listener.local_addr()?;
    // build state
    let state = build_state().await?;

    let clients = serve_clients(
        tcp_listener,
        state.arena.clone(),
        SessionSettings {
            handshake_timeout: config::HANDSHAKE_TIMEOUT,
            max_line_bytes: config::MAX_LINE_BYTES,
            outbound_queue: config::outbound_queue(),
        },
    );
    let app = routes::app(state);

    tracing::info!(%tcp_address, %http_address, "listening");

    // Serve both surfaces and report errors rather than panicking
    let http = async { axum::serve(http_listener, app).await };
    tokio::try_join!(clients, http)
        .map(|_| ())
        .inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let host = config::bind_host();
    let tcp_address = SocketAddr::new(host, config::tcp_port());
    let http_address = SocketAddr::new(host, config::http_port());

    // Bind TCP listeners with error handling
    let tcp_listener = TcpListener::bind(tcp_address).await.inspect_err(|e| {
        tracing::error!(address = %tcp_address, error = %e, "failed to bind");
    })?;
    let http_listener = TcpListener::bind(http_address).await.inspect_err(|e| {
        tracing::error!(address = %http_address, error = %e, "failed to bind");
    })?;

    run(tcp_listener, http_listener).await
}

async fn build_state() -> Result<Arc<AppState>> {
    let arena = Arc::new(Arena::new(ArenaSettings {
        command_channel_capacity: config::ROOM_COMMAND_CAPACITY,
        default_tick_timeout: config::default_tick_timeout(),
    }));
    tracing::debug!(
        default_tick_timeout_ms = arena
            .settings()
            .default_tick_timeout
            .map(|timeout| timeout.as_millis() as u64),
        "arena configured"
    );

    if config::preset_rooms_enabled() {
        let presets = presets()
            .map_err(|e| std::io::Error::other(format!("invalid preset layout: {e}")))?;
        for preset in presets {
            let mut room = RoomConfig::new(preset.name, preset.layout);
            room.description = preset.description.to_string();
            room.tick_timeout = Some(Duration::from_millis(preset.tick_timeout_ms));
            arena
                .create_room(None, room)
                .await
                .map_err(|e| std::io::Error::other(format!("failed to create preset room: {e}")))?;
        }
    }

    Ok(Arc::new(AppState { arena }))
}
