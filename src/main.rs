// Multi-node ledger simulation - CLI

use clap::Parser;
use simcoin::Cli;

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = simcoin::run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
