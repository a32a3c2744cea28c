/// MiniSpec CLI
///
/// Streams a program file through the interpreter against the console
/// skills and any configured high-level skill library.

use minispec::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_cli().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
