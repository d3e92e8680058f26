use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::Server;
use server::routing::BroadcastStrategy;
use shared::WireFormat;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// UDP port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Wire format: delimited or binary
    #[arg(short, long, default_value = "delimited")]
    wire: WireFormat,

    /// Send broadcast-class messages once to this address
    /// (e.g. 255.255.255.255:1150) instead of to each session
    #[arg(short, long)]
    rendezvous: Option<SocketAddr>,

    /// Capacity of the outbound queue
    #[arg(short, long, default_value = "256")]
    queue_capacity: usize,

    /// Mark sessions silent for this many seconds as left (0 disables)
    #[arg(short, long, default_value = "0")]
    idle_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let config = ServerConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        wire: args.wire,
        broadcast: args
            .rendezvous
            .map(BroadcastStrategy::Rendezvous)
            .unwrap_or_default(),
        queue_capacity: args.queue_capacity,
        idle_timeout: (args.idle_timeout > 0).then(|| Duration::from_secs(args.idle_timeout)),
    };

    info!("Starting chat relay server...");
    let server = Server::new(config).await?;
    server.run().await?;

    Ok(())
}
