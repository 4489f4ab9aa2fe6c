mod board;
mod config;
mod display;
mod error;
mod export;
mod interaction;
mod notify;
mod parser;
mod session;
mod web;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use board::auto_assign;
use config::load_settings;
use display::print_board;
use export::export_to_file;
use parser::load_requests;

#[derive(Parser)]
#[command(name = "transport-allocations", about = "Allocate transport requests to bus and taxi loads")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Auto-assign a form export and write the allocation workbook
    Allocate {
        /// CSV export of the transport request form
        csv: PathBuf,
        /// Workbook to write (defaults to the configured output file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve the interactive allocation board
    Web {
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();

    match cli.command {
        Command::Web { port } => {
            if let Some(port) = port {
                settings.port = port;
            }
            info!(host = %settings.bind_host, port = settings.port, "starting web server");
            println!("Access the board at http://localhost:{}", settings.port);
            web::start_server(settings).await?;
        }
        Command::Allocate { csv, output } => {
            let persons = load_requests(&csv, &settings)?;
            println!("Loaded {} transport requests", persons.len());

            let board = auto_assign(persons, &settings);
            print_board(&board);

            let output = output.unwrap_or_else(|| PathBuf::from(&settings.output_file));
            export_to_file(&board, &output)?;
            println!("Successfully generated {}!", output.display());
        }
    }

    Ok(())
}
