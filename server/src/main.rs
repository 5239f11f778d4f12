use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::Server;

/// Parses command-line arguments, then serves until Ctrl+C.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = ServerConfig::parse();

    info!("Starting card room server...");
    info!(
        "Queues: ingress {}, egress {}; mailbox capacity {}",
        config.ingress_capacity(),
        config.egress_capacity(),
        config.mailbox_capacity()
    );

    let server = Server::bind(&config).await?;

    // Handle shutdown gracefully
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl+C, shutting down gracefully...");
        })
        .await;

    Ok(())
}
