use clap::Parser;
use hislip_client::{Client, DEFAULT_VENDOR_ID, STANDARD_PORT};

#[derive(clap::Parser)]
#[clap(author, version, about, long_about = None)]
struct Arguments {
    #[clap(short, long, default_value = "localhost")]
    ip: String,

    #[clap(short, long, default_value_t = STANDARD_PORT)]
    port: u16,

    #[clap(short, long, default_value = "hislip0")]
    subaddr: String,

    #[command(subcommand)]
    action: Action,
}

#[derive(clap::Subcommand)]
enum Action {
    /// Write a command to the instrument
    Write { command: String },
    /// Write a command and read back the response
    Query { command: String },
    /// Read the status byte
    Status,
    /// Device clear
    Clear,
}

#[async_std::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    femme::with_level(log::LevelFilter::Debug);
    let args = Arguments::parse();

    let mut client = Client::connect(
        (args.ip.as_str(), args.port),
        DEFAULT_VENDOR_ID,
        &args.subaddr,
    )
    .await?;

    println!(
        "connected: session_id={} overlap_mode={}",
        client.session_id(),
        client.overlap_mode()
    );

    match args.action {
        Action::Write { command } => {
            client.write(command.as_bytes()).await?;
        }
        Action::Query { command } => {
            let response = client.ask(command.as_bytes(), 3000).await?;
            println!("{}", String::from_utf8_lossy(&response));
        }
        Action::Status => {
            let (mav, status) = client.status_query().await?;
            println!("status=0x{status:02x} mav={mav}");
        }
        Action::Clear => {
            client.device_clear().await?;
        }
    }

    client.close().await?;
    Ok(())
}
