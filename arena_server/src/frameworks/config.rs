use std::{env, net::IpAddr, time::Duration};

// Runtime/server constants (not gameplay tuning).

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

pub fn bind_host() -> IpAddr {
    parsed("ARENA_BIND_HOST").unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

pub fn tcp_port() -> u16 {
    parsed("ARENA_TCP_PORT").unwrap_or(3001)
}

pub fn http_port() -> u16 {
    parsed("ARENA_HTTP_PORT").unwrap_or(8080)
}

/// Default per-tick wait for intents. `0` waits until every living snake has moved.
pub fn default_tick_timeout() -> Option<Duration> {
    let millis = parsed::<u64>("ARENA_TICK_TIMEOUT_MS").unwrap_or(1000);
    (millis > 0).then(|| Duration::from_millis(millis))
}

pub fn outbound_queue() -> usize {
    parsed::<usize>("ARENA_OUTBOUND_QUEUE")
        .filter(|size| *size > 0)
        .unwrap_or(64)
}

pub fn preset_rooms_enabled() -> bool {
    match env::var("ARENA_PRESET_ROOMS") {
        Ok(value) => !matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "0" | "false" | "off" | "no"
        ),
        Err(_) => true,
    }
}

pub const ROOM_COMMAND_CAPACITY: usize = 256;
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_LINE_BYTES: usize = 256;
