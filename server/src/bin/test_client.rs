//! Minimal interactive client for exercising the server by hand.
//!
//! Connects, prints everything the server says, and sends each stdin
//! line to the server with the protocol terminator appended. Any telnet
//! client works just as well; this exists so the repo is testable
//! without one.

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Server host
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[clap(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let address = format!("{}:{}", args.host, args.port);
    let stream = TcpStream::connect(&address).await?;
    println!("Connected to {}", address);

    let (read_half, mut write_half) = stream.into_split();

    // Print server lines as they arrive.
    let printer = tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            println!("{}", line.trim_end_matches('\r'));
        }
        println!("Server closed the connection");
    });

    // Forward stdin lines with the protocol terminator.
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = stdin.next_line().await? {
        let message = format!("{}{}", line, shared::TERMINATOR);
        if write_half.write_all(message.as_bytes()).await.is_err() {
            break;
        }
    }

    printer.abort();
    Ok(())
}
