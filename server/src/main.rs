use clap::Parser;
use log::{error, info};
use server::network::Server;
use server::words::Dictionary;
use std::path::PathBuf;

/// Multiplayer word-guessing game server.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Word list, one word per line
    dictionary: PathBuf,

    /// Address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[clap(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Number of guesses per round
    #[clap(short, long, default_value_t = shared::DEFAULT_GUESSES)]
    guesses: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let dict = Dictionary::load(&args.dictionary)?;
    info!(
        "Loaded {} words from {}",
        dict.len(),
        args.dictionary.display()
    );

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, dict, args.guesses).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
