// NRFI/YRFI pipeline entry point.
//
// 1. Parse arguments
// 2. Initialize tracing (log to file; stdout carries the command output)
// 3. Load config
// 4. Open database
// 5. Run the subcommand and print its report

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use nrfi_app::cli::{self, Command};
use nrfi_app::commands;
use nrfi_app::config;
use nrfi_store::Database;

fn main() -> anyhow::Result<()> {
    let invocation = match cli::parse_args(std::env::args().skip(1)) {
        Ok(inv) => inv,
        Err(e) => {
            eprintln!("error: {e}\n\n{}", cli::USAGE);
            std::process::exit(2);
        }
    };
    if invocation.command == Command::Help {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    init_tracing()?;
    info!("nrfi starting: {:?}", invocation.command);

    let config = config::load_config().context("failed to load configuration")?;
    let db_path = invocation.db_path.unwrap_or_else(|| config.db_path.clone());
    let db = Database::open(&db_path).context("failed to open database")?;
    info!("Database opened at {}", db_path);

    match invocation.command {
        Command::Ingest { dir } => {
            let dir = dir.unwrap_or_else(|| PathBuf::from(&config.snapshot_dir));
            print!("{}", commands::ingest::run(&db, &dir)?);
        }
        Command::Features => {
            print!("{}", commands::features::run(&config, &db)?);
        }
        Command::Predict { matchups } => {
            print!("{}", commands::predict::run(&config, &db, Path::new(&matchups))?);
        }
        Command::Help => println!("{}", cli::USAGE),
    }

    info!("nrfi finished");
    Ok(())
}

/// Initialize tracing to log to `logs/nrfi.log`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("nrfi.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nrfi=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
