// Command-line parsing for the `nrfi` binary.

use std::path::PathBuf;

use thiserror::Error;

pub const USAGE: &str = "\
usage: nrfi <command> [args]

commands:
  ingest [--dir <path>]    load daily JSON snapshots into the database
  features                 export the feature and training CSVs
  predict <matchups.json>  feature rows and strikeout projections for scheduled games

options:
  --db <path>              override [database] path from config/nrfi.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ingest { dir: Option<PathBuf> },
    Features,
    Predict { matchups: PathBuf },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub db_path: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("no command given")]
    MissingCommand,
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
    #[error("`{0}` needs a value")]
    MissingValue(String),
    #[error("predict needs a matchups file")]
    MissingMatchups,
    #[error("unexpected argument `{0}`")]
    Unexpected(String),
}

/// Value for `--name <v>` or `--name=<v>`, removed from `args`.
fn take_option(args: &mut Vec<String>, name: &str) -> Result<Option<String>, CliError> {
    let prefix = format!("{name}=");
    for idx in 0..args.len() {
        if let Some(v) = args[idx].strip_prefix(&prefix) {
            let v = v.to_string();
            args.remove(idx);
            if v.trim().is_empty() {
                return Err(CliError::MissingValue(name.into()));
            }
            return Ok(Some(v));
        }
        if args[idx] == name {
            let value = args.get(idx + 1).filter(|v| !v.starts_with("--")).cloned();
            let Some(value) = value else {
                return Err(CliError::MissingValue(name.into()));
            };
            args.drain(idx..=idx + 1);
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Parse arguments after the program name.
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Invocation, CliError> {
    let mut args: Vec<String> = args.into_iter().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        return Ok(Invocation {
            command: Command::Help,
            db_path: None,
        });
    }

    let db_path = take_option(&mut args, "--db")?;
    let dir = take_option(&mut args, "--dir")?;
    let dir_given = dir.is_some();

    let mut rest = args.into_iter();
    let command = match rest.next().as_deref() {
        None => return Err(CliError::MissingCommand),
        Some("ingest") => Command::Ingest {
            dir: dir.map(PathBuf::from),
        },
        Some("features") => Command::Features,
        Some("predict") => Command::Predict {
            matchups: rest.next().map(PathBuf::from).ok_or(CliError::MissingMatchups)?,
        },
        Some("help") => Command::Help,
        Some(other) => return Err(CliError::UnknownCommand(other.to_string())),
    };

    if let Some(extra) = rest.next() {
        return Err(CliError::Unexpected(extra));
    }
    if dir_given && !matches!(command, Command::Ingest { .. }) {
        return Err(CliError::Unexpected("--dir".into()));
    }

    Ok(Invocation { command, db_path })
}
