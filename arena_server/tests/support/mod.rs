// Shared primitives for one-time server bootstrapping across integration tests.
#![allow(dead_code)]

use std::{
    // `Arc` shares data between threads; `OnceLock` writes a value only once.
    sync::{Arc, OnceLock},
    // Sleep durations are used in readiness polling loops.
    time::Duration,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

/// Addresses of the shared test server.
#[derive(Debug, Clone)]
pub struct TestServer {
    pub http_url: String,
    pub tcp_addr: String,
}

// Global addresses used by all tests after the server publishes its bound ports.
static SERVER: OnceLock<TestServer> = OnceLock::new();
// One-time guard that ensures the server bootstrap path runs only once.
static SERVER_READY: OnceLock<()> = OnceLock::new();

// Ensure the test server is running and return the shared addresses.
pub fn ensure_server() -> &'static TestServer {
    // Run initialization exactly once even if multiple tests call this function.
    SERVER_READY.get_or_init(|| {
        // Local one-time slot where the server thread publishes its selected addresses.
        let published = Arc::new(OnceLock::<TestServer>::new());
        let published_thread = Arc::clone(&published);
        // Spawn an OS thread so the server outlives individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                // Bind to ephemeral ports to avoid collisions with local services.
                let tcp_listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral tcp port");
                let http_listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral http port");
                let tcp_addr = tcp_listener.local_addr().expect("get tcp addr");
                let http_addr = http_listener.local_addr().expect("get http addr");
                let _ = published_thread.set(TestServer {
                    http_url: format!("http://{http_addr}"),
                    tcp_addr: tcp_addr.to_string(),
                });
                // Serve until the test process exits.
                arena_server::run(tcp_listener, http_listener)
                    .await
                    .expect("server failed");
            });
        });
        wait_for_readiness(published);
    });

    SERVER.get().expect("server should be initialized")
}

// Wait for address publication and then for both sockets to accept connections.
fn wait_for_readiness(published: Arc<OnceLock<TestServer>>) {
    let server = loop {
        if let Some(server) = published.get() {
            break server.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };
    let _ = SERVER.set(server.clone());

    let http_addr = server
        .http_url
        .strip_prefix("http://")
        .expect("base url should use http://")
        .to_string();

    for _ in 0..100 {
        let http_ready = std::net::TcpStream::connect(&http_addr).is_ok();
        let tcp_ready = std::net::TcpStream::connect(&server.tcp_addr).is_ok();
        if http_ready && tcp_ready {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

/// A line-protocol client for the game socket.
pub struct LineClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl LineClient {
    pub async fn connect(server: &TestServer) -> Self {
        let stream = TcpStream::connect(&server.tcp_addr)
            .await
            .expect("connect to game socket");
        let (read_half, writer) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer,
        }
    }

    /// Connects, sends the name line and returns the assigned connection id.
    pub async fn join(server: &TestServer, name: &str) -> (Self, u64) {
        let mut client = Self::connect(server).await;
        client.send(name).await;
        let waiting = client.recv().await;
        assert_eq!(waiting["state"], "waiting");
        let id = waiting["id"].as_u64().expect("waiting id");
        (client, id)
    }

    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("write line");
    }

    /// Next JSON line, or `Value::Null` once the server closed the socket.
    pub async fn recv(&mut self) -> serde_json::Value {
        let mut line = String::new();
        let read = tokio::time::timeout(Duration::from_secs(5), self.reader.read_line(&mut line))
            .await
            .expect("line should arrive")
            .expect("read line");
        if read == 0 {
            return serde_json::Value::Null;
        }
        serde_json::from_str(line.trim_end()).expect("json line")
    }

    /// Skips lines until one has the given `state`.
    pub async fn recv_state(&mut self, state: &str) -> serde_json::Value {
        loop {
            let message = self.recv().await;
            assert!(!message.is_null(), "socket closed while waiting for {state}");
            if message["state"] == state {
                return message;
            }
        }
    }
}
