mod support;

use serde_json::{Value, json};

fn unique_room_id() -> String {
    format!("room-{}", uuid::Uuid::new_v4())
}

async fn create_room(client: &reqwest::Client, base_url: &str, body: Value) -> reqwest::Response {
    client
        .post(format!("{base_url}/rooms"))
        .json(&body)
        .send()
        .await
        .expect("request should succeed")
}

#[tokio::test]
async fn test_preset_rooms_are_listed() {
    let server = support::ensure_server();
    let client = reqwest::Client::new();

    let rooms: Value = client
        .get(format!("{}/rooms", server.http_url))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("json body");

    let names: Vec<&str> = rooms
        .as_array()
        .expect("room list")
        .iter()
        .filter_map(|room| room["name"].as_str())
        .collect();
    for preset in ["Simple", "Boxed", "Speckled", "Large"] {
        assert!(names.contains(&preset), "missing preset {preset}");
    }
}

#[tokio::test]
async fn test_room_creation_and_status() {
    let server = support::ensure_server();
    let client = reqwest::Client::new();
    let room_id = unique_room_id();

    let res = create_room(
        &client,
        &server.http_url,
        json!({
            "room_id": room_id,
            "name": "Walled",
            "width": 6,
            "height": 4,
            "walls": [{"x": 2, "y": 2}],
            "spawns": [{"cell": {"x": 0, "y": 0}, "heading": "East"}],
            "tick_timeout_ms": 0
        }),
    )
    .await;
    assert_eq!(res.status(), reqwest::StatusCode::CREATED);

    let status: Value = client
        .get(format!("{}/rooms/{room_id}", server.http_url))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("json body");
    assert_eq!(status["name"], "Walled");
    assert_eq!(status["state"], "idle");
    assert_eq!(status["height"], 4);
    assert_eq!(status["members"], json!([]));
}

#[tokio::test]
async fn test_unknown_room_returns_404() {
    let server = support::ensure_server();
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/rooms/{}/start", server.http_url, unique_room_id()))
        .send()
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = res.json().await.expect("json body");
    assert_eq!(body["error"], "room not found");
}

#[tokio::test]
async fn test_starting_an_empty_room_returns_409() {
    let server = support::ensure_server();
    let client = reqwest::Client::new();
    let room_id = unique_room_id();
    create_room(
        &client,
        &server.http_url,
        json!({"room_id": room_id, "width": 4, "height": 4}),
    )
    .await;

    let res = client
        .post(format!("{}/rooms/{room_id}/start", server.http_url))
        .send()
        .await
        .expect("request should succeed");

    assert_eq!(res.status(), reqwest::StatusCode::CONFLICT);
    let body: Value = res.json().await.expect("json body");
    assert_eq!(body["error"], "room has no subscribers");
}

#[tokio::test]
async fn test_reset_of_an_idle_room_is_a_no_op() {
    let server = support::ensure_server();
    let client = reqwest::Client::new();
    let room_id = unique_room_id();
    create_room(
        &client,
        &server.http_url,
        json!({"room_id": room_id, "layout": ["....", "....", "...."]}),
    )
    .await;

    for _ in 0..2 {
        let res = client
            .post(format!("{}/rooms/{room_id}/reset", server.http_url))
            .send()
            .await
            .expect("request should succeed");
        assert_eq!(res.status(), reqwest::StatusCode::OK);
        let body: Value = res.json().await.expect("json body");
        assert_eq!(body["state"], "idle");
    }
}
