use std::path::PathBuf;
use std::process;

use clap::Parser;
use stowdb_core::Database;

mod commands;
mod display;
mod executor;
mod parser;

use commands::Command;
use display::OutputMode;

/// StowDB console: inspect and maintain the central item database.
#[derive(Parser, Debug)]
#[command(name = "stowdb-console", version)]
struct Cli {
    /// Database file (default: ~/.local/share/stowdb/central.sqlite).
    #[arg(long, env = "STOWDB_PATH", global = true)]
    db: Option<PathBuf>,

    /// Output results as machine-parseable JSON.
    #[arg(short, long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stowdb")
        .join("central.sqlite")
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mode = OutputMode::from_flag(cli.json);
    let db_path = cli.db.unwrap_or_else(default_db_path);

    let db = match Database::open(&db_path) {
        Ok(db) => db,
        Err(e) => {
            display::render_error(
                &format!("cannot open {}: {e}", db_path.display()),
                mode,
            );
            process::exit(1);
        }
    };

    match executor::execute(&db, cli.command) {
        Ok(result) => display::render(&result, mode),
        Err(e) => {
            display::render_error(&e, mode);
            process::exit(1);
        }
    }
}
