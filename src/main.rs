#[tokio::main]
async fn main() {
    if let Err(err) = opsbridge::mcp::server::run_stdio().await {
        eprintln!("opsbridge: {}", err);
        std::process::exit(1);
    }
}
