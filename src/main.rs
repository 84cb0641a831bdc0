use clap::{Parser, Subcommand};

use nivesh::config::{ServeArgs, build_settings};

#[derive(Parser, Debug)]
#[command(name = "nivesh", about = "Portfolio allocation service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() {
    let Command::Serve(args) = Cli::parse().command;

    let settings = match build_settings(args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };
    nivesh::telemetry::init_tracing(settings.log_format);

    if let Err(e) = nivesh::api::run_http_server(settings).await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
