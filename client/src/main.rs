use clap::Parser;
use client::input::{generate_client_id, ChatInput};
use client::network::Client;
use log::info;
use shared::{check_field_len, WireFormat};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Display name (defaults to the client id)
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// Client id (defaults to six random hex digits)
    #[arg(long)]
    id: Option<String>,

    /// Local address to bind; use the server's rendezvous port to hear broadcasts
    #[arg(short = 'b', long, default_value = "0.0.0.0:0")]
    bind: String,

    /// Wire format: delimited or binary
    #[arg(short = 'w', long, default_value = "delimited")]
    wire: WireFormat,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let id = args.id.unwrap_or_else(generate_client_id);
    let name = args
        .name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| id.clone());

    check_field_len("client id", &id)?;
    check_field_len("name", &name)?;

    info!("Starting client {} ({})...", id, name);
    info!("Connecting to: {}", args.server);

    let input = ChatInput::new(id, name);
    let mut client = Client::new(&args.server, &args.bind, args.wire, input).await?;

    client.run().await?;

    Ok(())
}
