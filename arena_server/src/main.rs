#[tokio::main]
async fn main() {
    if arena_server::run_with_config().await.is_err() {
        // The failure is already logged by the server.
        std::process::exit(1);
    }
}
